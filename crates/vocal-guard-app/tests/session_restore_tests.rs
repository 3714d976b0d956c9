//! Integration tests for startup session restore and expiry handling.

mod common;

use std::sync::Arc;

use vocal_guard_core::Session;
use vocal_guard_session::{InitializeOutcome, SessionStore};

#[test]
fn session_restore_tests_discard_expired_token_and_clear_store() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let store = SessionStore::new(dir.path());
    let expired = Session::new(common::jwt_with_exp(1), "uid-1", Some("ana".to_string()), None)
        .expect("session should build");
    store.persist(&expired).expect("persist should work");

    let mut runtime = common::default_runtime(dir.path());
    let outcome = runtime
        .startup(2_000_000)
        .expect("startup should not fail on an expired record");

    assert_eq!(outcome, InitializeOutcome::DiscardedExpired);
    assert!(runtime.manager().current().is_none());
    assert!(store.load().is_none());
}

#[test]
fn session_restore_tests_keep_flagged_session_active_on_failed_verification() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let store = SessionStore::new(dir.path());
    let live = Session::new(
        common::jwt_with_exp(u32::MAX as u64),
        "uid-1",
        Some("ana".to_string()),
        None,
    )
    .expect("session should build");
    store.persist(&live).expect("persist should work");

    let auth = Arc::new(common::MockAuthTransport {
        reject_verify: true,
        ..common::MockAuthTransport::default()
    });
    let mut runtime = common::fixture_runtime(
        dir.path(),
        auth,
        Arc::new(common::RecordingUploadTransport::answering("{}")),
        Arc::new(common::MockHistoryTransport::answering("{}")),
    );

    let outcome = runtime.startup(1_000).expect("startup should work");

    assert_eq!(outcome, InitializeOutcome::Restored);
    // Lazy invalidation: the session stays active and only a warning is
    // recorded, so the UI does not flash the logged-out state.
    assert!(runtime.manager().current().is_some());
    assert!(runtime.manager().handle().auth_warning().is_some());
}
