//! Link store implementations.
//!
//! # Repositories
//!
//! - [`MemoryLinkRepository`] - Process-local store, used when no database is configured
//! - [`PgLinkRepository`] - PostgreSQL store with unique constraints on code and URL

pub mod memory_link_repository;
pub mod pg_link_repository;

pub use memory_link_repository::MemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;
