//! Korean mobile phone numbers.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Carrier prefix `01` plus an optional digit, then 3-4 digits, then 4 digits.
static MOBILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"^01[016789]?-[0-9]{3,4}-[0-9]{4}$").unwrap()
});

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is not a hyphenated Korean mobile number.
    #[error("phone number must look like 010-1234-5678")]
    InvalidFormat,
}

/// A hyphenated Korean mobile phone number, e.g. `010-1234-5678`.
///
/// ## Examples
///
/// ```
/// use goodsmall_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("010-1234-5678").is_ok());
/// assert!(PhoneNumber::parse("011-123-4567").is_ok());
/// assert!(PhoneNumber::parse("010-123-456").is_err());
/// assert!(PhoneNumber::parse("01012345678").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a `PhoneNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or does not match the
    /// hyphenated mobile number pattern.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        if s.is_empty() {
            return Err(PhoneNumberError::Empty);
        }
        if !Self::is_valid(s) {
            return Err(PhoneNumberError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns true if the input is a valid hyphenated mobile number.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        MOBILE_PATTERN.is_match(s)
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_mobile_numbers() {
        for number in [
            "010-1234-5678",
            "011-123-4567",
            "016-1234-5678",
            "017-999-0000",
            "018-1234-5678",
            "019-1234-5678",
            "01-123-4567",
        ] {
            assert!(PhoneNumber::is_valid(number), "{number} should be valid");
        }
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        for number in [
            "010-123-456",
            "01012345678",
            "012-1234-5678",
            "015-1234-5678",
            "010-12345-6789",
            "01|-1234-5678",
            "010-1234-5678 ",
            "02-123-4567",
            "010 1234 5678",
        ] {
            assert!(!PhoneNumber::is_valid(number), "{number} should be invalid");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneNumberError::Empty));
        assert_eq!(
            PhoneNumber::parse("010-123-456"),
            Err(PhoneNumberError::InvalidFormat)
        );
    }
}
