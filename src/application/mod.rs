//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide a clean API for the request
//! dispatcher.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short code derivation, deduplication and lookup
//! - [`services::rate_limiter::RateLimiter`] - Per-client sliding-window admission control

pub mod services;
