//! Sign-up flow against a mocked goods mall API.

#![allow(clippy::unwrap_used)]

use goodsmall_client::signup::{SignUpForm, SignUpValidationError};
use goodsmall_client::{Session, SessionError};
use goodsmall_client::{ApiConfig, GoodsMallClient};
use goodsmall_core::PasswordError;
use httpmock::prelude::*;
use serde_json::json;

fn anonymous_session(server: &MockServer) -> Session {
    let config = ApiConfig::new(&server.base_url()).unwrap();
    Session::new(GoodsMallClient::new(&config).unwrap(), None)
}

fn form() -> SignUpForm {
    SignUpForm {
        email: "freshman@sju.ac.kr".to_string(),
        password: "sejong2023!".to_string(),
        password_confirmation: "sejong2023!".to_string(),
        user_name: "Lee".to_string(),
        birth: "20040315".to_string(),
    }
}

#[tokio::test]
async fn test_check_email() {
    let server = MockServer::start();
    let check = server.mock(|when, then| {
        when.method(GET)
            .path("/auth/email")
            .query_param("email", "freshman@sju.ac.kr");
        then.status(200).json_body(json!({ "available": true }));
    });

    let mut session = anonymous_session(&server);
    assert!(session.check_email("freshman@sju.ac.kr").await.unwrap());
    assert_eq!(session.email_available(), Some(true));
    assert_eq!(check.calls(), 1);

    assert!(matches!(
        session.check_email("freshman").await,
        Err(SessionError::InvalidSignUp(SignUpValidationError::InvalidEmail(_)))
    ));
    assert_eq!(check.calls(), 1);
}

#[tokio::test]
async fn test_sign_up() {
    let server = MockServer::start();
    let signup = server.mock(|when, then| {
        when.method(POST).path("/auth/signup").json_body(json!({
            "email": "freshman@sju.ac.kr",
            "password": "sejong2023!",
            "userName": "Lee",
            "birth": "20040315"
        }));
        then.status(200);
    });

    let mut session = anonymous_session(&server);
    session.sign_up(&form()).await.unwrap();

    assert_eq!(signup.calls(), 1);
}

#[tokio::test]
async fn test_invalid_form_never_reaches_server() {
    let server = MockServer::start();
    let signup = server.mock(|when, then| {
        when.method(POST).path("/auth/signup");
        then.status(200);
    });

    let mut session = anonymous_session(&server);
    let short = SignUpForm {
        password: "short".to_string(),
        password_confirmation: "short".to_string(),
        ..form()
    };

    assert_eq!(
        session.sign_up(&short).await,
        Err(SessionError::InvalidSignUp(
            SignUpValidationError::InvalidPassword(PasswordError::TooShort { min: 8 })
        ))
    );
    assert_eq!(signup.calls(), 0);
}
