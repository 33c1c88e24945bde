//! Explicit service context shared by all connections.

use std::sync::Arc;

use crate::application::services::{LinkService, RateLimiter};

/// Services constructed once at startup and handed to the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(link_service: Arc<LinkService>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            link_service,
            rate_limiter,
        }
    }
}
