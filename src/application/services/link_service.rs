//! Link creation and retrieval service.

use std::sync::Arc;

use crate::domain::entities::NewLink;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::derive_code;
use tracing::debug;

/// Service for creating and resolving short links.
///
/// Codes are derived from the URL content, so a URL always maps to the same
/// code. The store holds at most one record per URL.
#[derive(Clone)]
pub struct LinkService {
    link_repository: Arc<dyn LinkRepository>,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(link_repository: Arc<dyn LinkRepository>) -> Self {
        Self { link_repository }
    }

    /// Returns the short code for `url`, creating the record on first use.
    ///
    /// # Deduplication
    ///
    /// If the URL is already stored, its existing code is returned without
    /// hashing or inserting. Otherwise the code is derived and the record is
    /// inserted through [`LinkRepository::insert`], which is atomic: two
    /// concurrent first-time creates for the same URL both end up with the
    /// single stored record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the derived code already belongs to a
    /// different URL.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn create_short_link(&self, url: &str) -> Result<String, AppError> {
        if let Some(existing) = self.link_repository.find_by_url(url).await? {
            debug!("Link for {} already exists: {}", url, existing.short_code);
            return Ok(existing.short_code);
        }

        let new_link = NewLink {
            original_url: url.to_string(),
            short_code: derive_code(url),
        };

        let record = self.link_repository.insert(new_link).await?;
        debug!("Created link {} -> {}", record.short_code, record.original_url);

        Ok(record.short_code)
    }

    /// Looks up the original URL for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn resolve_short_link(&self, code: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .link_repository
            .find_by_code(code)
            .await?
            .map(|record| record.original_url))
    }
}
