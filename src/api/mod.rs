//! Request/response layer over a raw message-passing connection.
//!
//! # Modules
//!
//! - [`connection`] - Scope, body chunks, outbound messages and the [`connection::Connection`] trait
//! - [`dispatcher`] - Body assembly, routing and the create/redirect flows
//! - [`response`] - Mapping of outcomes to status, headers and body
//! - [`dto`] - Request parsing and response bodies
//! - [`transport`] - axum/hyper bridge that feeds connections to the dispatcher

pub mod connection;
pub mod dispatcher;
pub mod dto;
pub mod response;
pub mod transport;
