//! Domain layer containing the link entity and the store contract.
//!
//! The domain layer has no dependencies on infrastructure or transport code.
//! Storage backends implement [`repositories::LinkRepository`] in
//! `crate::infrastructure::persistence`.

pub mod entities;
pub mod repositories;
