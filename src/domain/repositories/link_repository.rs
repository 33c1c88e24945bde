//! Repository trait for short link data access.

use crate::domain::entities::{LinkRecord, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Exact-match persistence for `(original_url, short_code)` pairs.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - guarded in-process maps
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Finds a record by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<LinkRecord>, AppError>;

    /// Finds a record by its original URL (exact string match).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_url(&self, original_url: &str) -> Result<Option<LinkRecord>, AppError>;

    /// Atomically inserts a record, or returns the existing record for the
    /// same URL.
    ///
    /// Implementations must enforce uniqueness of both `original_url` and
    /// `short_code` as a single atomic step, so that concurrent inserts for the
    /// same URL converge on one record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code is already taken by a
    /// different URL.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn insert(&self, new_link: NewLink) -> Result<LinkRecord, AppError>;
}
