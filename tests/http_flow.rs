mod common;

use axum_test::TestServer;
use http::{HeaderValue, StatusCode, header};
use serde_json::json;
use std::time::Duration;

use short_links::api::transport::TransportConfig;
use short_links::application::services::RateLimitPolicy;

async fn shorten(server: &TestServer, url: &str) -> String {
    let (name, value) = common::host();
    let response = server
        .post("/short-link")
        .add_header(name, value)
        .json(&json!({ "url": url }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<serde_json::Value>();
    json["short_link"].as_str().unwrap().to_string()
}

fn code_of(short_link: &str) -> String {
    short_link.rsplit('/').next().unwrap().to_string()
}

#[tokio::test]
async fn test_create_short_link() {
    let server = common::create_test_server();

    let short_link = shorten(&server, "https://example.com/some/page?x=1").await;

    let code = code_of(&short_link);
    assert_eq!(short_link, format!("http://{}/{}", common::TEST_HOST, code));
    assert_eq!(code.len(), 32);
    assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_create_is_idempotent() {
    let server = common::create_test_server();

    let first = shorten(&server, "https://example.com/a").await;
    let second = shorten(&server, "https://example.com/a").await;
    let other = shorten(&server, "https://example.com/b").await;

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[tokio::test]
async fn test_create_and_redirect_long_url() {
    let server = common::create_test_server();
    let url = format!("https://example.com/{}", "a".repeat(8 * 1024));

    let short_link = shorten(&server, &url).await;
    let response = server.get(&format!("/{}", code_of(&short_link))).await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header(header::LOCATION), url.as_str());
}

#[tokio::test]
async fn test_create_response_headers() {
    let server = common::create_test_server();
    let (name, value) = common::host();

    let response = server
        .post("/short-link/")
        .add_header(name, value)
        .json(&json!({ "url": "http://localhost:8080/" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.header(header::CONTENT_TYPE), "application/json");
    assert_eq!(
        response.header(header::CONTENT_LENGTH),
        response.as_bytes().len().to_string().as_str()
    );
}

#[tokio::test]
async fn test_create_validation_errors() {
    let server = common::create_test_server();

    let cases = [
        (json!({}), json!({ "url": "Required field." })),
        (json!({ "url": "" }), json!({ "url": "Required field." })),
        (json!({ "url": null }), json!({ "url": "Required field." })),
        (json!({ "url": 42 }), json!({ "url": "Field must be a string." })),
        (json!({ "url": "not a url" }), json!({ "url": "Field must be a URL." })),
        (json!({ "url": "ftp://example.com" }), json!({ "url": "Field must be a URL." })),
        (json!(["https://example.com"]), json!({ "non_field": "Invalid JSON structure." })),
    ];

    for (body, expected) in cases {
        let (name, value) = common::host();
        let response = server
            .post("/short-link")
            .add_header(name, value)
            .json(&body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>(), expected, "body: {}", body);
    }
}

#[tokio::test]
async fn test_create_invalid_json() {
    let server = common::create_test_server();
    let (name, value) = common::host();

    let response = server
        .post("/short-link")
        .add_header(name, value)
        .text("{\"url\": ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "non_field": "Invalid JSON structure." }));
}

#[tokio::test]
async fn test_create_body_too_large() {
    let server = common::create_test_server_with(
        RateLimitPolicy::default(),
        TransportConfig {
            max_body_bytes: 16,
            ..TransportConfig::default()
        },
    );
    let (name, value) = common::host();

    let response = server
        .post("/short-link")
        .add_header(name, value)
        .json(&json!({ "url": "https://example.com/a/rather/long/path" }))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_short_link_other_methods_not_allowed() {
    let server = common::create_test_server();

    server
        .get("/short-link")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    server
        .delete("/short-link")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    server
        .put("/abc")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_redirect_to_original_url() {
    let server = common::create_test_server();
    let short_link = shorten(&server, "https://example.com/target?q=1").await;

    let response = server.get(&format!("/{}", code_of(&short_link))).await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        response.header(header::LOCATION),
        "https://example.com/target?q=1"
    );
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn test_redirect_unknown_code() {
    let server = common::create_test_server();

    let response = server.get("/0123456789abcdef0123456789abcdef").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn test_redirect_rate_limited() {
    let server = common::create_test_server();
    let short_link = shorten(&server, "https://example.com/").await;
    let path = format!("/{}", code_of(&short_link));

    for _ in 0..5 {
        server.get(&path).await.assert_status(StatusCode::FOUND);
    }
    server
        .get(&path)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
    server
        .get("/unknown")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_create_is_not_rate_limited() {
    let server = common::create_test_server_with(
        RateLimitPolicy {
            max_requests: 1,
            window: Duration::from_secs(60),
            block_duration: Duration::from_secs(60),
        },
        TransportConfig::default(),
    );

    server.get("/x").await.assert_status(StatusCode::NOT_FOUND);
    server
        .get("/x")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    shorten(&server, "https://example.com/still-allowed").await;
}

#[tokio::test]
async fn test_rate_limit_per_forwarded_client() {
    let server = common::create_test_server_with(
        RateLimitPolicy {
            max_requests: 1,
            window: Duration::from_secs(60),
            block_duration: Duration::from_secs(60),
        },
        TransportConfig {
            behind_proxy: true,
            ..TransportConfig::default()
        },
    );

    let first = HeaderValue::from_static("203.0.113.1");
    let second = HeaderValue::from_static("203.0.113.2");

    for (client, expected) in [
        (&first, StatusCode::NOT_FOUND),
        (&first, StatusCode::TOO_MANY_REQUESTS),
        (&second, StatusCode::NOT_FOUND),
    ] {
        server
            .get("/x")
            .add_header(http::HeaderName::from_static("x-forwarded-for"), client.clone())
            .await
            .assert_status(expected);
    }
}

#[tokio::test]
async fn test_forwarded_scheme_in_short_link() {
    let server = common::create_test_server_with(
        RateLimitPolicy::default(),
        TransportConfig {
            behind_proxy: true,
            ..TransportConfig::default()
        },
    );
    let (name, value) = common::host();

    let response = server
        .post("/short-link")
        .add_header(name, value)
        .add_header(
            http::HeaderName::from_static("x-forwarded-proto"),
            HeaderValue::from_static("https"),
        )
        .json(&json!({ "url": "https://example.com/" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let short_link = response.json::<serde_json::Value>()["short_link"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(short_link.starts_with("https://s.test/"));
}
