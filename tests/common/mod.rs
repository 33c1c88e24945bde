#![allow(dead_code)]

use axum_test::TestServer;
use http::{HeaderValue, header};
use std::sync::Arc;

use short_links::api::transport::TransportConfig;
use short_links::application::services::{LinkService, RateLimitPolicy, RateLimiter};
use short_links::infrastructure::persistence::MemoryLinkRepository;
use short_links::server::app;
use short_links::state::AppState;

pub const TEST_HOST: &str = "s.test";

pub fn create_test_state(policy: RateLimitPolicy) -> AppState {
    let link_repo = Arc::new(MemoryLinkRepository::new());
    let link_service = Arc::new(LinkService::new(link_repo));
    let rate_limiter = Arc::new(RateLimiter::new(policy));

    AppState::new(link_service, rate_limiter)
}

pub fn create_test_server_with(policy: RateLimitPolicy, config: TransportConfig) -> TestServer {
    TestServer::new(app(create_test_state(policy), config)).unwrap()
}

pub fn create_test_server() -> TestServer {
    create_test_server_with(RateLimitPolicy::default(), TransportConfig::default())
}

pub fn host() -> (http::HeaderName, HeaderValue) {
    (header::HOST, HeaderValue::from_static(TEST_HOST))
}
