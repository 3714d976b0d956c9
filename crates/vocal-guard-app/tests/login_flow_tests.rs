//! Integration tests for the login flow and persistence contract.

mod common;

use std::sync::Arc;

use vocal_guard_app::AppError;
use vocal_guard_auth::{AccountResponse, AuthError};
use vocal_guard_session::SessionStore;

#[test]
fn login_flow_tests_session_matches_response_and_persists_all_fields() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let mut runtime = common::default_runtime(dir.path());

    let session = runtime
        .login("ana@example.test", "secret")
        .expect("login should succeed");

    assert_eq!(session.token, "token-abc");
    assert_eq!(session.user_id, "uid-1");
    assert_eq!(session.username, "ana");
    assert_eq!(session.email.as_deref(), Some("ana@example.test"));

    let store = SessionStore::new(dir.path());
    assert_eq!(store.load(), Some(session));
}

#[test]
fn login_flow_tests_defaults_username_from_email_local_part() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let auth = Arc::new(common::MockAuthTransport {
        account_response: AccountResponse {
            token: "token-abc".to_string(),
            user_id: "uid-1".to_string(),
            username: None,
            email: None,
        },
        ..common::MockAuthTransport::default()
    });
    let mut runtime = common::fixture_runtime(
        dir.path(),
        auth,
        Arc::new(common::RecordingUploadTransport::answering("{}")),
        Arc::new(common::MockHistoryTransport::answering("{}")),
    );

    let session = runtime
        .login("mira@example.test", "secret")
        .expect("login should succeed");

    assert_eq!(session.username, "mira");
}

#[test]
fn login_flow_tests_signup_establishes_a_session_like_login() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let mut runtime = common::default_runtime(dir.path());

    let session = runtime
        .signup("ana@example.test", "secret", "ana")
        .expect("signup should succeed");

    assert_eq!(session.user_id, "uid-1");
    assert_eq!(SessionStore::new(dir.path()).load(), Some(session));
}

#[test]
fn login_flow_tests_forgot_password_mutates_no_session_state() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let runtime = common::default_runtime(dir.path());

    runtime
        .forgot_password("ana@example.test")
        .expect("reset request should succeed");

    assert!(runtime.manager().current().is_none());
    assert!(matches!(
        runtime.forgot_password("  "),
        Err(AppError::Auth(AuthError::EmptyCredential))
    ));
}

#[test]
fn login_flow_tests_reject_response_without_token_and_persist_nothing() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let auth = Arc::new(common::MockAuthTransport {
        account_response: AccountResponse {
            token: String::new(),
            user_id: "uid-1".to_string(),
            username: None,
            email: None,
        },
        ..common::MockAuthTransport::default()
    });
    let mut runtime = common::fixture_runtime(
        dir.path(),
        auth,
        Arc::new(common::RecordingUploadTransport::answering("{}")),
        Arc::new(common::MockHistoryTransport::answering("{}")),
    );

    let error = runtime.login("ana@example.test", "secret").unwrap_err();
    assert!(matches!(
        error,
        AppError::Auth(AuthError::InvalidResponse(_))
    ));
    assert!(runtime.manager().current().is_none());
    assert!(SessionStore::new(dir.path()).load().is_none());
}
