//! Short code derivation.
//!
//! Codes are content-addressed: the code of a URL is the hex encoding of the
//! first [`CODE_LENGTH_BYTES`] bytes of its SHA-256 digest. The same URL always
//! yields the same code, across calls and across process restarts.

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a short code (32 hex characters).
pub const CODE_LENGTH_BYTES: usize = 16;

/// Derives the short code for `url`.
///
/// The URL is hashed exactly as given. Two URLs that differ only in case or
/// a trailing slash get different codes.
///
/// # Examples
///
/// ```ignore
/// let code = derive_code("https://example.com");
/// assert_eq!(code.len(), 32);
/// assert_eq!(code, derive_code("https://example.com"));
/// ```
pub fn derive_code(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..CODE_LENGTH_BYTES])
}

/// Full SHA-256 of `url` as 64 hex characters.
///
/// Used as the fixed-size uniqueness key for stored URLs.
pub fn url_digest(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}
