//! Korean postal codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Zipcode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZipcodeError {
    #[error("zipcode cannot be empty")]
    Empty,
    #[error("zipcode must be exactly {expected} digits")]
    InvalidFormat { expected: usize },
}

/// A five-digit Korean postal code (국가기초구역번호).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Zipcode(String);

impl Zipcode {
    /// Number of digits in a postal code.
    pub const LENGTH: usize = 5;

    /// Parse a `Zipcode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or is not exactly five ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ZipcodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ZipcodeError::Empty);
        }
        if s.len() != Self::LENGTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ZipcodeError::InvalidFormat {
                expected: Self::LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the postal code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zipcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
