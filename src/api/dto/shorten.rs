//! DTOs for the link shortening endpoint.

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, NON_FIELD};
use crate::utils::url_validator::is_valid_url;

pub const MSG_INVALID_JSON: &str = "Invalid JSON structure.";
pub const MSG_REQUIRED: &str = "Required field.";
pub const MSG_NOT_STRING: &str = "Field must be a string.";
pub const MSG_NOT_URL: &str = "Field must be a URL.";

/// Validated request to shorten a URL.
///
/// Parsed by hand from a [`serde_json::Value`] rather than derived, so each
/// failure maps to its own field message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenRequest {
    pub url: String,
}

impl ShortenRequest {
    /// Parses and validates a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] with:
    /// - `non_field` if the body is not a JSON object
    /// - `url` if the field is missing, empty, not a string, or not a URL
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| AppError::field(NON_FIELD, MSG_INVALID_JSON))?;

        let Value::Object(mut fields) = value else {
            return Err(AppError::field(NON_FIELD, MSG_INVALID_JSON));
        };

        match fields.remove("url") {
            None | Some(Value::Null) => Err(AppError::field("url", MSG_REQUIRED)),
            Some(Value::String(url)) if url.is_empty() => {
                Err(AppError::field("url", MSG_REQUIRED))
            }
            Some(Value::String(url)) if !is_valid_url(&url) => {
                Err(AppError::field("url", MSG_NOT_URL))
            }
            Some(Value::String(url)) => Ok(Self { url }),
            Some(_) => Err(AppError::field("url", MSG_NOT_STRING)),
        }
    }
}

/// Response body of a successful shortening.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_link: String,
}
