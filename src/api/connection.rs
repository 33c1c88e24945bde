//! Message-passing connection interface consumed by the dispatcher.
//!
//! A request is described by its [`Scope`] and exchanged through a
//! [`Connection`]: the dispatcher pulls body chunks with
//! [`Connection::receive`] and pushes the response with
//! [`Connection::send`]. These are the only two points at which a request
//! suspends.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use std::net::SocketAddr;

/// Per-request metadata provided by the hosting transport.
#[derive(Debug, Clone)]
pub struct Scope {
    pub method: Method,
    pub path: String,
    /// Client identity used for rate limiting.
    pub client_addr: Option<SocketAddr>,
    pub headers: HeaderMap,
    /// `http` or `https`, as seen by the client.
    pub scheme: String,
}

impl Scope {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            client_addr: None,
            headers: HeaderMap::new(),
            scheme: "http".to_string(),
        }
    }

    pub fn with_client(mut self, addr: SocketAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Value of the `Host` header, if present and valid UTF-8.
    pub fn host(&self) -> Option<&str> {
        self.headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
    }

    /// Rate-limiting key for this request. Requests without a known peer
    /// share one bucket.
    pub fn client_id(&self) -> String {
        self.client_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// One inbound body message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyChunk {
    pub bytes: Bytes,
    /// `true` if more chunks follow.
    pub more: bool,
}

impl BodyChunk {
    pub fn new(bytes: impl Into<Bytes>, more: bool) -> Self {
        Self {
            bytes: bytes.into(),
            more,
        }
    }

    /// A terminal, empty chunk.
    pub fn end() -> Self {
        Self::new(Bytes::new(), false)
    }
}

/// One outbound response message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Start {
        status: StatusCode,
        headers: Vec<(HeaderName, HeaderValue)>,
    },
    Body {
        chunk: Bytes,
        /// `true` if more body messages follow.
        more: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to receive request body: {0}")]
    Receive(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("request body stalled for more than {0:?}")]
    IdleTimeout(std::time::Duration),

    #[error("connection closed before the response was sent")]
    Closed,
}

/// Bidirectional message channel for a single request.
#[async_trait]
pub trait Connection: Send {
    /// Waits for the next request body chunk.
    async fn receive(&mut self) -> Result<BodyChunk, TransportError>;

    /// Waits until the transport accepts `message`.
    async fn send(&mut self, message: OutboundMessage) -> Result<(), TransportError>;
}

/// Reads the whole request body by accumulating chunks until one arrives
/// with `more == false`. The result may be empty.
///
/// # Errors
///
/// Propagates the first [`TransportError`] returned by `receive`.
pub async fn read_body<C: Connection + ?Sized>(conn: &mut C) -> Result<Bytes, TransportError> {
    let mut body = Vec::new();
    loop {
        let chunk = conn.receive().await?;
        body.extend_from_slice(&chunk.bytes);
        if !chunk.more {
            break;
        }
    }
    Ok(Bytes::from(body))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted connection for driving the dispatcher in tests.

    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    pub struct ScriptedConnection {
        pub inbound: VecDeque<Result<BodyChunk, TransportError>>,
        pub sent: Vec<OutboundMessage>,
        pub receive_calls: usize,
    }

    impl ScriptedConnection {
        /// A connection whose body arrives in the given chunks.
        pub fn with_chunks(chunks: &[&str]) -> Self {
            let mut inbound = VecDeque::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let more = i + 1 < chunks.len();
                inbound.push_back(Ok(BodyChunk::new(chunk.as_bytes().to_vec(), more)));
            }
            Self {
                inbound,
                ..Self::default()
            }
        }

        pub fn with_body(body: &str) -> Self {
            Self::with_chunks(&[body])
        }

        pub fn status(&self) -> Option<StatusCode> {
            self.sent.iter().find_map(|message| match message {
                OutboundMessage::Start { status, .. } => Some(*status),
                OutboundMessage::Body { .. } => None,
            })
        }

        pub fn header(&self, name: &HeaderName) -> Option<String> {
            self.sent.iter().find_map(|message| match message {
                OutboundMessage::Start { headers, .. } => headers
                    .iter()
                    .find(|(header, _)| header == name)
                    .and_then(|(_, value)| value.to_str().ok())
                    .map(str::to_string),
                OutboundMessage::Body { .. } => None,
            })
        }

        pub fn body(&self) -> Vec<u8> {
            self.sent
                .iter()
                .filter_map(|message| match message {
                    OutboundMessage::Body { chunk, .. } => Some(chunk.to_vec()),
                    OutboundMessage::Start { .. } => None,
                })
                .flatten()
                .collect()
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body()).expect("response body is JSON")
        }
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn receive(&mut self) -> Result<BodyChunk, TransportError> {
            self.receive_calls += 1;
            self.inbound.pop_front().unwrap_or_else(|| Ok(BodyChunk::end()))
        }

        async fn send(&mut self, message: OutboundMessage) -> Result<(), TransportError> {
            self.sent.push(message);
            Ok(())
        }
    }
}
