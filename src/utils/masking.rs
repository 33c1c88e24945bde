//! Masking of personal contact data.
//!
//! Each [`Masker`] validates its input against a pattern and replaces the
//! sensitive part with a mask symbol:
//!
//! - [`EmailMasker`] - hides the local part: `john@example.com` → `****@example.com`
//! - [`PhoneMasker`] - hides the last digits: `+7 912 345 67 89` → `+7 912 345 6* **`
//! - [`SkypeMasker`] - hides the handle: `skype:john.doe` → `skype:***`

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r#"|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")"#,
        r"@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?",
        r"|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}",
        r"(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:",
        r"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$",
    ))
    .expect("email regex is valid")
});

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+7\s*\d{3}\s*\d{3}\s*\d{2}\s*\d{2}$").expect("phone regex is valid")
});

const SKYPE_HANDLE: &str = r"skype:(?:[a-z]+\.)*[a-z]+";

static SKYPE_HANDLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SKYPE_HANDLE).expect("skype handle regex is valid"));

static SKYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"^(?:{SKYPE_HANDLE}$|<a href="{SKYPE_HANDLE}\?call">.*</a>$)"#
    ))
    .expect("skype regex is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MaskingError {
    #[error("input does not match the expected {kind} format")]
    PatternMismatch { kind: &'static str },
}

/// A masking strategy for one kind of contact data.
pub trait Masker {
    /// Human-readable name of the data kind, used in errors.
    fn kind(&self) -> &'static str;

    /// Pattern the whole input must match before masking.
    fn pattern(&self) -> &Regex;

    /// Masks input that is already known to match [`Masker::pattern`].
    fn mask_unchecked(&self, input: &str) -> String;

    /// Validates `input` and returns its masked form.
    ///
    /// # Errors
    ///
    /// Returns [`MaskingError::PatternMismatch`] if `input` does not match.
    fn mask(&self, input: &str) -> Result<String, MaskingError> {
        if !self.pattern().is_match(input) {
            return Err(MaskingError::PatternMismatch { kind: self.kind() });
        }
        Ok(self.mask_unchecked(input))
    }
}

/// Replaces every character of the local part of an email address.
#[derive(Debug, Clone)]
pub struct EmailMasker {
    symbol: char,
}

impl EmailMasker {
    pub fn new(symbol: char) -> Self {
        Self { symbol }
    }
}

impl Masker for EmailMasker {
    fn kind(&self) -> &'static str {
        "email"
    }

    fn pattern(&self) -> &Regex {
        &EMAIL_REGEX
    }

    fn mask_unchecked(&self, input: &str) -> String {
        match input.rsplit_once('@') {
            Some((local, domain)) => {
                let masked: String = local.chars().map(|_| self.symbol).collect();
                format!("{masked}@{domain}")
            }
            None => input.to_string(),
        }
    }
}

/// Replaces the trailing digits of a `+7` phone number.
#[derive(Debug, Clone)]
pub struct PhoneMasker {
    symbol: char,
    count: usize,
}

impl PhoneMasker {
    pub const DEFAULT_COUNT: usize = 3;

    pub fn new(symbol: char) -> Self {
        Self::with_count(symbol, Self::DEFAULT_COUNT)
    }

    pub fn with_count(symbol: char, count: usize) -> Self {
        Self { symbol, count }
    }
}

impl Masker for PhoneMasker {
    fn kind(&self) -> &'static str {
        "phone"
    }

    fn pattern(&self) -> &Regex {
        &PHONE_REGEX
    }

    fn mask_unchecked(&self, input: &str) -> String {
        let collapsed = WHITESPACE_RUN.replace_all(input, " ");
        let mut remaining = self.count;
        let mut chars: Vec<char> = collapsed.chars().collect();
        for c in chars.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            if c.is_ascii_digit() {
                *c = self.symbol;
                remaining -= 1;
            }
        }
        chars.into_iter().collect()
    }
}

/// Replaces a Skype handle, either bare or inside a call link.
#[derive(Debug, Clone)]
pub struct SkypeMasker {
    symbol: char,
}

impl SkypeMasker {
    pub fn new(symbol: char) -> Self {
        Self { symbol }
    }
}

impl Masker for SkypeMasker {
    fn kind(&self) -> &'static str {
        "skype"
    }

    fn pattern(&self) -> &Regex {
        &SKYPE_REGEX
    }

    fn mask_unchecked(&self, input: &str) -> String {
        let replacement: String = std::iter::repeat_n(self.symbol, 3).collect();
        SKYPE_HANDLE_REGEX
            .replacen(input, 1, format!("skype:{replacement}").as_str())
            .into_owned()
    }
}
