//! Sign-up commands.

use goodsmall_client::Session;
use goodsmall_client::signup::SignUpForm;

use crate::CliError;

/// Check whether an email address is free.
pub async fn check(session: &mut Session, email: &str) -> Result<(), CliError> {
    if session.check_email(email).await? {
        tracing::info!("{email} is available");
    } else {
        tracing::warn!("{email} is already registered");
    }
    Ok(())
}

/// Register a new account.
pub async fn register(session: &mut Session, form: &SignUpForm) -> Result<(), CliError> {
    session.sign_up(form).await?;
    tracing::info!("Account created for {}", form.email.trim());
    Ok(())
}
