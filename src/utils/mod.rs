//! Utility functions for code derivation, URL checks and text masking.
//!
//! - [`client_info`] - Client IP and scheme from proxy headers
//! - [`code_generator`] - Deterministic short code derivation
//! - [`url_validator`] - Strict URL-shape check for submitted links
//! - [`masking`] - Masking of emails, phone numbers and Skype handles

pub mod client_info;
pub mod code_generator;
pub mod masking;
pub mod url_validator;
