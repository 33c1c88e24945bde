//! Response emission over a [`Connection`].
//!
//! Every request produces exactly one [`Reply`], which is written as one
//! `Start` message followed by one terminal `Body` message.
//!
//! | Reply                     | Status | Body                       |
//! |---------------------------|--------|----------------------------|
//! | `Created`                 | 201    | `{"short_link": "<url>"}`  |
//! | `Redirect`                | 302    | empty, `location` header   |
//! | `Error(NotFound)`         | 404    | empty                      |
//! | `Error(RateLimited)`      | 429    | empty                      |
//! | `Error(MethodNotAllowed)` | 405    | empty                      |
//! | `Error(Validation)`       | 400    | `{"<field>": "<message>"}` |
//! | `Error(Conflict/Internal)`| 500    | empty                      |

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode, header};
use serde::Serialize;
use tracing::error;

use crate::api::connection::{Connection, OutboundMessage, TransportError};
use crate::api::dto::shorten::ShortenResponse;
use crate::error::AppError;

/// Outcome of a request, ready to be emitted.
#[derive(Debug)]
pub enum Reply {
    Created { short_link: String },
    Redirect { location: String },
    Error(AppError),
}

impl From<AppError> for Reply {
    fn from(err: AppError) -> Self {
        Reply::Error(err)
    }
}

/// Status, headers and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseParts {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Bytes,
}

impl ResponseParts {
    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![(header::CONTENT_LENGTH, HeaderValue::from(0u64))],
            body: Bytes::new(),
        }
    }

    fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                headers: vec![
                    (
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    ),
                    (header::CONTENT_LENGTH, HeaderValue::from(body.len() as u64)),
                ],
                body: Bytes::from(body),
            },
            Err(e) => {
                error!("Failed to serialize response body: {}", e);
                Self::empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl Reply {
    /// Maps the reply to its wire representation.
    pub fn into_parts(self) -> ResponseParts {
        match self {
            Reply::Created { short_link } => {
                ResponseParts::json(StatusCode::CREATED, &ShortenResponse { short_link })
            }
            Reply::Redirect { location } => match HeaderValue::from_str(&location) {
                Ok(value) => {
                    let mut parts = ResponseParts::empty(StatusCode::FOUND);
                    parts.headers.insert(0, (header::LOCATION, value));
                    parts
                }
                Err(_) => {
                    error!("Stored URL is not a valid Location header: {}", location);
                    ResponseParts::empty(StatusCode::INTERNAL_SERVER_ERROR)
                }
            },
            Reply::Error(AppError::Validation { fields }) => {
                ResponseParts::json(StatusCode::BAD_REQUEST, &fields)
            }
            Reply::Error(err) => ResponseParts::empty(err.status()),
        }
    }
}

/// Writes `reply` to `conn` as a start message and a single body message.
///
/// # Errors
///
/// Returns the [`TransportError`] of the first rejected `send`.
pub async fn emit<C: Connection + ?Sized>(conn: &mut C, reply: Reply) -> Result<(), TransportError> {
    let parts = reply.into_parts();

    conn.send(OutboundMessage::Start {
        status: parts.status,
        headers: parts.headers,
    })
    .await?;

    conn.send(OutboundMessage::Body {
        chunk: parts.body,
        more: false,
    })
    .await
}
