//! # Short Links
//!
//! An edge service with two operations: create a short code for a URL, and
//! redirect a short code to its original URL.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Link entity and the store contract
//! - **Application Layer** ([`application`]) - Code derivation/deduplication and rate limiting
//! - **Infrastructure Layer** ([`infrastructure`]) - In-memory and PostgreSQL stores
//! - **API Layer** ([`api`]) - Connection abstraction, dispatcher and response emitter
//!
//! ## Request Flow
//!
//! 1. The transport turns an inbound request into a [`api::connection::Scope`]
//!    and a [`api::connection::Connection`]
//! 2. [`api::dispatcher::RequestDispatcher`] routes by path and method
//! 3. `POST /short-link` reads the streamed body, validates it and derives a code
//! 4. `GET /<code>` consults the [`application::services::RateLimiter`] first,
//!    then looks the code up
//! 5. The outcome is written back as a start message plus a body message
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub use error::AppError;
pub use state::AppState;

