//! Integration tests for route gating across session transitions.

mod common;

use vocal_guard_core::Session;
use vocal_guard_session::SessionStore;
use vocal_guard_ui::View;

#[test]
fn route_guard_tests_redirect_protected_views_without_any_session() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let mut runtime = common::default_runtime(dir.path());
    runtime.startup(1_000).expect("startup should work");

    assert_eq!(runtime.navigate(View::History), View::Login);
    assert_eq!(runtime.navigate(View::Upload), View::Login);
    assert_eq!(runtime.navigate(View::Home), View::Home);
}

#[test]
fn route_guard_tests_redirect_after_mid_session_logout() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let mut runtime = common::default_runtime(dir.path());
    runtime
        .login("ana@example.test", "secret")
        .expect("login should succeed");

    assert_eq!(runtime.navigate(View::History), View::History);

    runtime.logout().expect("logout should work");
    assert_eq!(runtime.navigate(View::History), View::Login);
}

#[test]
fn route_guard_tests_redirect_when_session_expired_at_startup() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let store = SessionStore::new(dir.path());
    let expired = Session::new(common::jwt_with_exp(1), "uid-1", Some("ana".to_string()), None)
        .expect("session should build");
    store.persist(&expired).expect("persist should work");

    let mut runtime = common::default_runtime(dir.path());
    runtime.startup(2_000_000).expect("startup should work");

    assert_eq!(runtime.navigate(View::Result), View::Login);
}
