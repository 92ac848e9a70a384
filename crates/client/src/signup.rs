//! Sign-up form validation.

use chrono::NaiveDate;
use goodsmall_core::{Email, EmailError, Password, PasswordError};
use thiserror::Error;

use crate::api::SignUpRequest;

/// Birth date format expected by the server.
const BIRTH_FORMAT: &str = "%Y%m%d";

/// Validation failures detected before a sign-up request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignUpValidationError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("{0}")]
    InvalidPassword(#[from] PasswordError),
    #[error("user name is required")]
    EmptyUserName,
    #[error("birth date must be YYYYMMDD")]
    InvalidBirth,
}

/// Sign-up fields as typed by the user.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub user_name: String,
    pub birth: String,
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("email", &self.email)
            .field("user_name", &self.user_name)
            .field("birth", &self.birth)
            .finish_non_exhaustive()
    }
}

impl SignUpForm {
    /// Validate the form and build the request body.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule, checked in field order.
    pub fn validate(&self) -> Result<SignUpRequest, SignUpValidationError> {
        let email = Email::parse(&self.email)?;
        let password = Password::new(&self.password, &self.password_confirmation)?;

        let user_name = self.user_name.trim();
        if user_name.is_empty() {
            return Err(SignUpValidationError::EmptyUserName);
        }

        let birth = self.birth.trim();
        if birth.len() != 8 || NaiveDate::parse_from_str(birth, BIRTH_FORMAT).is_err() {
            return Err(SignUpValidationError::InvalidBirth);
        }

        Ok(SignUpRequest {
            email,
            password: password.expose().to_owned(),
            user_name: user_name.to_owned(),
            birth: birth.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> SignUpForm {
        SignUpForm {
            email: "student@sju.ac.kr".to_string(),
            password: "goods1234".to_string(),
            password_confirmation: "goods1234".to_string(),
            user_name: " Kim Sejong ".to_string(),
            birth: "20010203".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let request = form().validate().unwrap();
        assert_eq!(request.email.as_str(), "student@sju.ac.kr");
        assert_eq!(request.user_name, "Kim Sejong");
        assert_eq!(request.birth, "20010203");
    }

    #[test]
    fn test_invalid_fields() {
        let bad_email = SignUpForm {
            email: "not-an-email".to_string(),
            ..form()
        };
        assert!(matches!(
            bad_email.validate(),
            Err(SignUpValidationError::InvalidEmail(_))
        ));

        let mismatch = SignUpForm {
            password_confirmation: "goods12345".to_string(),
            ..form()
        };
        assert_eq!(
            mismatch.validate(),
            Err(SignUpValidationError::InvalidPassword(PasswordError::Mismatch))
        );

        let no_name = SignUpForm {
            user_name: String::new(),
            ..form()
        };
        assert_eq!(no_name.validate(), Err(SignUpValidationError::EmptyUserName));
    }

    #[test]
    fn test_birth_format() {
        for birth in ["2001-02-03", "20011302", "200102", "2001020a"] {
            let form = SignUpForm {
                birth: birth.to_string(),
                ..form()
            };
            assert_eq!(
                form.validate(),
                Err(SignUpValidationError::InvalidBirth),
                "{birth} should be rejected"
            );
        }
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", form()).contains("goods1234"));
    }
}
