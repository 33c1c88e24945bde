//! Request-level error taxonomy.
//!
//! Every failure in the request path is an [`AppError`]. None of them are fatal
//! to the process: the dispatcher catches them and turns them into a response.

use http::StatusCode;
use std::collections::BTreeMap;

/// Field name used for errors that do not belong to a single input field.
pub const NON_FIELD: &str = "non_field";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed, missing or mistyped input. Carries a field -> message map
    /// that is returned verbatim as the JSON body of a 400 response.
    #[error("validation failed: {fields:?}")]
    Validation { fields: BTreeMap<String, String> },

    #[error("short link not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("too many requests")]
    RateLimited,

    /// A uniqueness constraint of the store rejected the write.
    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Builds a single-field validation error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), message.into());
        Self::Validation { fields }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status the error is surfaced as.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Conflict { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(format!(
            "unique constraint violation: {}",
            db.constraint().unwrap_or("unknown")
        ));
    }

    tracing::error!("Database error: {}", e);
    AppError::internal("database error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_builds_single_entry_map() {
        let err = AppError::field("url", "Required field.");
        match err {
            AppError::Validation { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields["url"], "Required field.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::field(NON_FIELD, "x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_non_unique_sqlx_error_is_internal() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
