//! Unified error handling with Sentry integration.
//!
//! [`ApiError`] is the closed set of failures an API call can produce.
//! [`Presentation::for_error`] is the single place that decides how each
//! failure reaches the user, and [`ErrorReport::new`] captures server-side
//! failures to Sentry on the way through.

use thiserror::Error;

/// A domain conflict reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    /// The goods item (with the same options) is already in the cart.
    #[error("goods already in cart")]
    AlreadyInCart,
    /// The cart entries an order refers to no longer exist.
    #[error("cart is empty")]
    CartEmpty,
}

/// Errors that can occur when calling the goods mall API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Missing, expired or rejected bearer token.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// Non-success HTTP status.
    #[error("invalid response: HTTP {status}")]
    InvalidResponse { status: u16 },

    /// The server could not be reached.
    #[error("cannot connect to the network")]
    NoNetwork,

    /// Lower-level transport failure.
    #[error("transport error: {message}")]
    Transport { code: Option<i32>, message: String },

    /// Response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// Server rejected the request because of current domain state.
    #[error("conflict: {0}")]
    Conflict(Conflict),

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl ApiError {
    /// Returns true if an automatic retry might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::InvalidResponse { .. } | Self::NoNetwork | Self::Transport { .. }
        )
    }

    /// Returns true if the failure originates on the server or is unexplained.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::InvalidResponse { status } => *status >= 500,
            Self::Unknown(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            return Self::NoNetwork;
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transport {
            code: os_error_code(&err),
            message: err.to_string(),
        }
    }
}

/// Walk the source chain looking for an OS-level error code.
fn os_error_code(err: &(dyn std::error::Error + 'static)) -> Option<i32> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>()
            && let Some(code) = io.raw_os_error()
        {
            return Some(code);
        }
        current = e.source();
    }
    None
}

/// How a failure is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Error screen. `retryable` decides whether it offers a retry action.
    Blocking { retryable: bool },
    /// Non-blocking toast message; never retried.
    Silent { message: &'static str },
}

impl Presentation {
    /// Decide how an error is presented.
    #[must_use]
    pub const fn for_error(error: &ApiError) -> Self {
        match error {
            ApiError::AuthenticationFailure | ApiError::Conflict(_) => {
                Self::Blocking { retryable: false }
            }
            ApiError::InvalidResponse { .. }
            | ApiError::NoNetwork
            | ApiError::Transport { .. }
            | ApiError::Unknown(_) => Self::Blocking { retryable: true },
            ApiError::Decode(_) => Self::Silent {
                message: "데이터 디코딩 에러",
            },
            ApiError::Encode(_) => Self::Silent {
                message: "데이터 인코딩 에러",
            },
        }
    }

    /// Returns true if the presentation offers a retry action.
    #[must_use]
    pub const fn offers_retry(&self) -> bool {
        matches!(self, Self::Blocking { retryable: true })
    }
}

/// An error together with its presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub error: ApiError,
    pub presentation: Presentation,
}

impl ErrorReport {
    /// Translate an error for the presentation layer.
    ///
    /// Server-side failures are captured to Sentry.
    #[must_use]
    pub fn new(error: ApiError) -> Self {
        if error.is_server_side() {
            let event_id = sentry::capture_error(&error);
            tracing::error!(
                error = %error,
                sentry_event_id = %event_id,
                "API error"
            );
        } else {
            tracing::warn!(error = %error, "API error");
        }

        let presentation = Presentation::for_error(&error);
        Self {
            error,
            presentation,
        }
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("order", "Order submitted", Some(&[("order_id", "31")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::InvalidResponse { status: 500 }.to_string(),
            "invalid response: HTTP 500"
        );
        assert_eq!(
            ApiError::Conflict(Conflict::AlreadyInCart).to_string(),
            "conflict: goods already in cart"
        );
        assert_eq!(
            ApiError::Transport {
                code: Some(54),
                message: "reset".to_string()
            }
            .to_string(),
            "transport error: reset"
        );
    }

    #[test]
    fn test_no_retry_for_auth_and_conflicts() {
        for error in [
            ApiError::AuthenticationFailure,
            ApiError::Conflict(Conflict::AlreadyInCart),
            ApiError::Conflict(Conflict::CartEmpty),
        ] {
            assert_eq!(
                Presentation::for_error(&error),
                Presentation::Blocking { retryable: false }
            );
        }
    }

    #[test]
    fn test_retry_for_connectivity_errors() {
        for error in [
            ApiError::InvalidResponse { status: 503 },
            ApiError::NoNetwork,
            ApiError::Transport {
                code: None,
                message: "broken pipe".to_string(),
            },
            ApiError::Unknown("?".to_string()),
        ] {
            assert!(Presentation::for_error(&error).offers_retry());
        }
    }

    #[test]
    fn test_codec_errors_are_silent() {
        assert!(matches!(
            Presentation::for_error(&ApiError::Decode("eof".to_string())),
            Presentation::Silent { .. }
        ));
        assert!(matches!(
            Presentation::for_error(&ApiError::Encode("nan".to_string())),
            Presentation::Silent { .. }
        ));
    }

    #[test]
    fn test_server_side_classification() {
        assert!(ApiError::InvalidResponse { status: 500 }.is_server_side());
        assert!(!ApiError::InvalidResponse { status: 404 }.is_server_side());
        assert!(!ApiError::NoNetwork.is_server_side());
    }

    #[test]
    fn test_report_carries_presentation() {
        let report = ErrorReport::new(ApiError::NoNetwork);
        assert!(report.presentation.offers_retry());
        assert_eq!(report.error, ApiError::NoNetwork);
    }

    #[test]
    fn test_os_error_code_from_io_error() {
        let io = std::io::Error::from_raw_os_error(111);
        assert_eq!(os_error_code(&io), Some(111));
    }
}
