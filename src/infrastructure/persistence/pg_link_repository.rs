//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{LinkRecord, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::url_digest;

/// PostgreSQL repository for link storage and retrieval.
///
/// Uniqueness of `short_code` and of `original_url` (through its full
/// SHA-256, `url_digest`) is enforced by table constraints (see
/// `migrations/`), so deduplication holds across processes sharing the
/// database and for URLs of any length.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<LinkRecord>, AppError> {
        let record = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT id, original_url, short_code, created_at
            FROM links
            WHERE short_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn find_by_url(&self, original_url: &str) -> Result<Option<LinkRecord>, AppError> {
        let record = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT id, original_url, short_code, created_at
            FROM links
            WHERE url_digest = $1 AND original_url = $2
            "#,
        )
        .bind(url_digest(original_url))
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn insert(&self, new_link: NewLink) -> Result<LinkRecord, AppError> {
        // A URL conflict means another writer got there first; the code
        // constraint is left to raise a unique violation (-> Conflict).
        let inserted = sqlx::query_as::<_, LinkRecord>(
            r#"
            INSERT INTO links (original_url, url_digest, short_code)
            VALUES ($1, $2, $3)
            ON CONFLICT (url_digest) DO NOTHING
            RETURNING id, original_url, short_code, created_at
            "#,
        )
        .bind(&new_link.original_url)
        .bind(url_digest(&new_link.original_url))
        .bind(&new_link.short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        if let Some(record) = inserted {
            return Ok(record);
        }

        self.find_by_url(&new_link.original_url)
            .await?
            .ok_or_else(|| AppError::internal("link vanished after insert conflict"))
    }
}
