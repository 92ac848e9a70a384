//! Subcommand implementations.
//!
//! Each command drives a [`Session`] and reports through `tracing`.

pub mod cart;
pub mod goods;
pub mod order;
pub mod scrap;
pub mod signup;

use goodsmall_client::{Session, SessionEvent};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Log session events at debug level until the session is dropped.
pub fn log_events(session: &Session) -> JoinHandle<()> {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::ErrorRaised(report)) => {
                    tracing::debug!(
                        error = %report.error,
                        retryable = report.presentation.offers_retry(),
                        "Session error"
                    );
                }
                Ok(event) => tracing::debug!(?event, "Session event"),
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Session event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
