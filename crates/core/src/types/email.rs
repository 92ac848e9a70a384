//! Sign-up email addresses.

use core::fmt;
use core::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Word characters joined by `-+.'`, an `@`, then a dotted domain.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"^\w+([-+.']\w+)*@\w+([-.]\w+)*\.\w+([-.]\w+)*$").unwrap()
});

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email address is malformed")]
    InvalidFormat,
}

/// An email address, used as the account login.
///
/// Surrounding whitespace is trimmed; the domain must contain a dot.
///
/// ```
/// use goodsmall_core::Email;
///
/// assert!(Email::parse("student@sju.ac.kr").is_ok());
/// assert!(Email::parse(" first.last+goods@sju.ac.kr ").is_ok());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Longest address accepted (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or not shaped like `local@domain.tld`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !EMAIL_PATTERN.is_match(s) {
            return Err(EmailError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        for email in [
            "student@sju.ac.kr",
            "first.last@sejong.ac.kr",
            "club+goods@gmail.com",
            "o'brien@mail.example.org",
            "a@b.c",
        ] {
            assert!(Email::parse(email).is_ok(), "{email} should be accepted");
        }
    }

    #[test]
    fn test_rejects() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        for email in [
            "no-at-symbol",
            "@sju.ac.kr",
            "student@",
            "student@localhost",
            "two@@sju.ac.kr",
            "spaces in@sju.ac.kr",
        ] {
            assert_eq!(
                Email::parse(email),
                Err(EmailError::InvalidFormat),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@sju.ac.kr", "a".repeat(250));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong { max: 254 })
        );
    }

    #[test]
    fn test_trims_and_displays() {
        let email: Email = " student@sju.ac.kr\n".parse().unwrap();
        assert_eq!(email.to_string(), "student@sju.ac.kr");
    }
}
