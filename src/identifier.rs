//! Profile Identifier
//!
//! A UID is a run of 5-15 ASCII digits. It is the only user input that is
//! validated; nothing is checked against the upstream before a lookup.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Shortest accepted UID
pub const MIN_DIGITS: usize = 5;
/// Longest accepted UID
pub const MAX_DIGITS: usize = 15;

/// A standalone digit run: not preceded or followed by another digit.
static EMBEDDED_UID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{5,15})(?:[^0-9]|$)").expect("static regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("UID is missing")]
    Missing,

    #[error("UID must be {MIN_DIGITS}–{MAX_DIGITS} digits")]
    Malformed,
}

/// Validated profile identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Parse a string that must consist solely of 5-15 digits.
    ///
    /// Surrounding whitespace is trimmed first.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdentifierError::Missing);
        }
        let len = raw.len();
        if (MIN_DIGITS..=MAX_DIGITS).contains(&len) && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(IdentifierError::Malformed)
        }
    }

    /// Find the first standalone 5-15 digit run anywhere in `text`.
    ///
    /// Longer digit runs are not split: "1234567890123456789" has no match.
    pub fn find_embedded(text: &str) -> Option<Self> {
        EMBEDDED_UID
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .next()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
