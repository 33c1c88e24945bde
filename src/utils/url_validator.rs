//! Strict URL-shape check for links submitted for shortening.
//!
//! A URL is accepted when:
//!
//! 1. It contains no whitespace
//! 2. It parses as an absolute URL with an `http` or `https` scheme
//! 3. Its host is `localhost`, an IP literal, or a domain name made of
//!    dot-separated labels ending in an alphabetic (or punycode) TLD
//!
//! The submitted string itself is never rewritten; this module only answers
//! whether it is acceptable.

use regex::Regex;
use std::sync::LazyLock;
use url::{Host, Url};

/// Domain name with at least one dot and an alphabetic or punycode TLD.
/// Hosts reach this check already lowercased by the URL parser.
static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+(?:[a-z]{2,63}|xn--[a-z0-9-]{1,59})\.?$",
    )
    .expect("domain regex is valid")
});

/// Errors returned by [`check_url`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlShapeError {
    #[error("URL contains whitespace")]
    Whitespace,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL host is missing or malformed")]
    InvalidHost,
}

/// Checks `input` against the strict URL shape.
///
/// # Errors
///
/// Returns the first [`UrlShapeError`] rule the input violates.
pub fn check_url(input: &str) -> Result<(), UrlShapeError> {
    if input.chars().any(char::is_whitespace) {
        return Err(UrlShapeError::Whitespace);
    }

    let url = Url::parse(input).map_err(|e| UrlShapeError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlShapeError::UnsupportedProtocol),
    }

    match url.host() {
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(()),
        Some(Host::Domain(domain)) if domain == "localhost" || DOMAIN_REGEX.is_match(domain) => {
            Ok(())
        }
        _ => Err(UrlShapeError::InvalidHost),
    }
}

/// Returns `true` if `input` passes [`check_url`].
pub fn is_valid_url(input: &str) -> bool {
    check_url(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_simple_https() {
        assert!(is_valid_url("https://example.com"));
    }

    #[test]
    fn test_accepts_path_query_and_fragment() {
        assert!(is_valid_url("https://example.com/a/b?q=rust&lang=en#top"));
    }

    #[test]
    fn test_accepts_uppercase_host() {
        assert!(is_valid_url("HTTPS://EXAMPLE.COM/Path"));
    }

    #[test]
    fn test_accepts_subdomain_and_port() {
        assert!(is_valid_url("http://api.example.co.uk:8080/v1"));
    }

    #[test]
    fn test_accepts_localhost() {
        assert!(is_valid_url("http://localhost:3000/test"));
    }

    #[test]
    fn test_accepts_ip_literals() {
        assert!(is_valid_url("http://192.168.1.1:8080/api"));
        assert!(is_valid_url("http://[::1]/"));
    }

    #[test]
    fn test_accepts_punycode_tld() {
        assert!(is_valid_url("https://example.xn--p1ai/"));
    }

    #[test]
    fn test_rejects_missing_scheme() {
        assert!(matches!(
            check_url("example.com"),
            Err(UrlShapeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_other_schemes() {
        for input in [
            "ftp://example.com/file.txt",
            "javascript:alert('xss')",
            "mailto:test@example.com",
            "file:///etc/passwd",
        ] {
            assert_eq!(
                check_url(input),
                Err(UrlShapeError::UnsupportedProtocol),
                "{input}"
            );
        }
    }

    #[test]
    fn test_rejects_host_without_tld() {
        assert_eq!(check_url("http://intranet/"), Err(UrlShapeError::InvalidHost));
    }

    #[test]
    fn test_rejects_numeric_tld() {
        assert!(!is_valid_url("http://example.123/"));
    }

    #[test]
    fn test_rejects_whitespace() {
        assert_eq!(
            check_url("https://example.com/a b"),
            Err(UrlShapeError::Whitespace)
        );
        assert_eq!(
            check_url(" https://example.com"),
            Err(UrlShapeError::Whitespace)
        );
    }

    #[test]
    fn test_rejects_plain_text() {
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("definitely-not-a-url"));
        assert!(!is_valid_url(""));
    }
}
