//! In-memory implementation of the link repository.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entities::{LinkRecord, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    by_code: HashMap<String, LinkRecord>,
    code_by_url: HashMap<String, String>,
}

/// Process-local link store.
///
/// Both indexes live behind a single mutex, so the uniqueness checks and the
/// write in [`LinkRepository::insert`] happen as one step.
#[derive(Debug, Default)]
pub struct MemoryLinkRepository {
    tables: Mutex<Tables>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.tables.lock().await.by_code.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<LinkRecord>, AppError> {
        Ok(self.tables.lock().await.by_code.get(code).cloned())
    }

    async fn find_by_url(&self, original_url: &str) -> Result<Option<LinkRecord>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .code_by_url
            .get(original_url)
            .and_then(|code| tables.by_code.get(code))
            .cloned())
    }

    async fn insert(&self, new_link: NewLink) -> Result<LinkRecord, AppError> {
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables
            .code_by_url
            .get(&new_link.original_url)
            .and_then(|code| tables.by_code.get(code))
        {
            return Ok(existing.clone());
        }

        if tables.by_code.contains_key(&new_link.short_code) {
            return Err(AppError::conflict(format!(
                "short code {} is already taken",
                new_link.short_code
            )));
        }

        tables.next_id += 1;
        let record = LinkRecord::new(
            tables.next_id,
            new_link.original_url,
            new_link.short_code,
            Utc::now(),
        );
        tables
            .code_by_url
            .insert(record.original_url.clone(), record.short_code.clone());
        tables
            .by_code
            .insert(record.short_code.clone(), record.clone());

        Ok(record)
    }
}
