//! HTTP transport bridge.
//!
//! Hosts the [`RequestDispatcher`] behind axum/hyper without using axum's
//! routing: every request lands in one fallback handler, which turns it into
//! a [`Scope`] plus an [`HttpConnection`] and runs the dispatcher on its own
//! task.
//!
//! ```text
//! hyper request ──► Scope + body frames ──► RequestDispatcher
//!                                              │ send()
//! hyper response ◄── start + body stream ◄─── mpsc channel
//! ```

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, BodyDataStream};
use axum::extract::{ConnectInfo, Request, State};
use axum::response::Response;
use bytes::Bytes;
use futures_util::StreamExt;
use http::request::Parts;
use http::{HeaderValue, StatusCode, header};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span, warn};

use crate::api::connection::{BodyChunk, Connection, OutboundMessage, Scope, TransportError};
use crate::api::dispatcher::RequestDispatcher;
use crate::utils::client_info::{forwarded_client_ip, forwarded_scheme};

/// Outbound messages buffered between the dispatcher task and hyper.
const OUTBOUND_BUFFER: usize = 4;

/// Transport-level settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Read client IP and scheme from proxy headers.
    pub behind_proxy: bool,
    /// Scheme used in generated short links when the request does not carry one.
    pub public_scheme: String,
    /// Maximum wait for the next request body frame.
    pub body_idle_timeout: Duration,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            behind_proxy: false,
            public_scheme: "http".to_string(),
            body_idle_timeout: Duration::from_secs(30),
            max_body_bytes: 64 * 1024,
        }
    }
}

#[derive(Clone)]
struct TransportState {
    dispatcher: RequestDispatcher,
    config: Arc<TransportConfig>,
}

/// A [`Connection`] backed by a hyper request body and an outbound channel.
pub struct HttpConnection {
    body: BodyDataStream,
    outbound: mpsc::Sender<OutboundMessage>,
    idle_timeout: Duration,
    max_body_bytes: usize,
    received: usize,
    finished: bool,
}

impl HttpConnection {
    pub fn new(
        body: Body,
        outbound: mpsc::Sender<OutboundMessage>,
        config: &TransportConfig,
    ) -> Self {
        Self {
            body: body.into_data_stream(),
            outbound,
            idle_timeout: config.body_idle_timeout,
            max_body_bytes: config.max_body_bytes,
            received: 0,
            finished: false,
        }
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn receive(&mut self) -> Result<BodyChunk, TransportError> {
        if self.finished {
            return Ok(BodyChunk::end());
        }

        let frame = tokio::time::timeout(self.idle_timeout, self.body.next())
            .await
            .map_err(|_| TransportError::IdleTimeout(self.idle_timeout))?;

        match frame {
            None => {
                self.finished = true;
                Ok(BodyChunk::end())
            }
            Some(Err(e)) => Err(TransportError::Receive(e.to_string())),
            Some(Ok(bytes)) => {
                self.received += bytes.len();
                if self.received > self.max_body_bytes {
                    return Err(TransportError::BodyTooLarge {
                        limit: self.max_body_bytes,
                    });
                }
                Ok(BodyChunk::new(bytes, true))
            }
        }
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<(), TransportError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

/// Builds the [`Scope`] of a request.
///
/// Behind a proxy the client address and scheme come from forwarding
/// headers, falling back to the peer address and the configured scheme.
pub fn build_scope(parts: &Parts, peer: Option<SocketAddr>, config: &TransportConfig) -> Scope {
    let mut headers = parts.headers.clone();
    if !headers.contains_key(header::HOST)
        && let Some(authority) = parts.uri.authority()
        && let Ok(value) = HeaderValue::from_str(authority.as_str())
    {
        headers.insert(header::HOST, value);
    }

    let forwarded_ip = if config.behind_proxy {
        forwarded_client_ip(&headers)
    } else {
        None
    };
    let client_addr = match forwarded_ip {
        Some(ip) => Some(SocketAddr::new(ip, 0)),
        None => peer,
    };

    let scheme = config
        .behind_proxy
        .then(|| forwarded_scheme(&headers))
        .flatten()
        .or(parts.uri.scheme_str())
        .unwrap_or(config.public_scheme.as_str())
        .to_string();

    Scope {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        client_addr,
        headers,
        scheme,
    }
}

/// Creates the router hosting the dispatcher.
pub fn router(dispatcher: RequestDispatcher, config: TransportConfig) -> Router {
    let state = TransportState {
        dispatcher,
        config: Arc::new(config),
    };

    Router::new()
        .fallback(serve_request)
        .with_state(state)
        .layer(trace_layer())
}

async fn serve_request(State(state): State<TransportState>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let (parts, body) = request.into_parts();
    let scope = build_scope(&parts, peer, &state.config);

    let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER);
    let mut conn = HttpConnection::new(body, tx, &state.config);
    let dispatcher = state.dispatcher.clone();

    let task = tokio::spawn(async move {
        let result = dispatcher.dispatch(&scope, &mut conn).await;
        if let Err(ref e) = result {
            warn!("{} {} aborted: {}", scope.method, scope.path, e);
        }
        result
    });

    match rx.recv().await {
        Some(OutboundMessage::Start { status, headers }) => {
            let mut response = Response::new(Body::from_stream(body_stream(rx)));
            *response.status_mut() = status;
            for (name, value) in headers {
                response.headers_mut().append(name, value);
            }
            response
        }
        Some(OutboundMessage::Body { .. }) => {
            warn!("Dispatcher sent a body before the response start");
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
        None => {
            let status = match task.await {
                Ok(Err(TransportError::BodyTooLarge { .. })) => StatusCode::PAYLOAD_TOO_LARGE,
                Ok(Err(TransportError::IdleTimeout(_))) => StatusCode::REQUEST_TIMEOUT,
                Ok(Err(TransportError::Receive(_))) => StatusCode::BAD_REQUEST,
                Ok(_) | Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            empty_response(status)
        }
    }
}

/// Turns the remaining `Body` messages into a response body stream, ending
/// after the message with `more == false`.
fn body_stream(
    rx: mpsc::Receiver<OutboundMessage>,
) -> impl futures_util::Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    futures_util::stream::unfold((rx, false), |(mut rx, done)| async move {
        if done {
            return None;
        }
        match rx.recv().await {
            Some(OutboundMessage::Body { chunk, more }) => Some((Ok(chunk), (rx, !more))),
            Some(OutboundMessage::Start { .. }) => {
                warn!("Dispatcher sent a second response start");
                None
            }
            None => None,
        }
    })
}

fn empty_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(0u64));
    response
}

#[derive(Clone, Copy)]
struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &http::Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
        )
    }
}

/// Request span plus status and latency logging for every request.
fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http().make_span_with(RequestSpan).on_response(
        DefaultOnResponse::new()
            .level(Level::INFO)
            .latency_unit(LatencyUnit::Millis),
    )
}
