//! Sign-up password rules.

use core::fmt;

/// Errors that can occur when accepting a [`Password`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("password confirmation does not match")]
    Mismatch,
}

/// A password that satisfies the sign-up rules.
///
/// Implements `Debug` manually so the value never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Minimum number of characters.
    pub const MIN_LENGTH: usize = 8;

    /// Accept a password and its confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is shorter than eight characters or
    /// the confirmation differs.
    pub fn new(password: &str, confirmation: &str) -> Result<Self, PasswordError> {
        if password.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if password != confirmation {
            return Err(PasswordError::Mismatch);
        }
        Ok(Self(password.to_owned()))
    }

    /// Returns the raw password for the sign-up request body.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}
