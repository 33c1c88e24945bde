//! Client identity extraction from proxy headers.

use http::{HeaderMap, HeaderName};
use std::net::IpAddr;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Extracts the originating client IP set by a reverse proxy.
///
/// Checks, in order:
/// - the first valid entry of `X-Forwarded-For`
/// - `X-Real-IP`
///
/// Only meaningful when the service runs behind a trusted proxy; otherwise
/// clients can spoof these headers.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(X_FORWARDED_FOR.clone(), "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// assert_eq!(forwarded_client_ip(&headers), Some("203.0.113.7".parse().unwrap()));
/// ```
pub fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_xff = headers
        .get(&X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|xff| {
            xff.split(',')
                .map(str::trim)
                .find_map(|entry| entry.parse::<IpAddr>().ok())
        });

    from_xff.or_else(|| {
        headers
            .get(&X_REAL_IP)
            .and_then(|value| value.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

/// Returns the scheme reported by `X-Forwarded-Proto`, if it is `http` or `https`.
pub fn forwarded_scheme(headers: &HeaderMap) -> Option<&'static str> {
    let proto = headers
        .get(&X_FORWARDED_PROTO)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim();

    if proto.eq_ignore_ascii_case("https") {
        Some("https")
    } else if proto.eq_ignore_ascii_case("http") {
        Some("http")
    } else {
        None
    }
}
