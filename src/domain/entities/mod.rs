//! Core domain entities.
//!
//! - [`LinkRecord`] - A persisted URL ↔ short code mapping
//! - [`NewLink`] - Input for creating a record

pub mod link;

pub use link::{LinkRecord, NewLink};
