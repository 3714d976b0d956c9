//! Integration tests for the history detail view.

mod common;

use std::sync::Arc;

#[test]
fn history_detail_tests_reconstruct_known_entries_locally() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let mut runtime = common::default_runtime(dir.path());
    runtime
        .login("ana@example.test", "secret")
        .expect("login should succeed");
    runtime.refresh_history().expect("fetch should succeed");

    let detail = runtime
        .history_detail("a-1")
        .expect("detail should reconstruct");

    assert_eq!(detail.filename, "clip_alpha.wav");
    assert!(detail.is_ai);
    assert_eq!(detail.confidence, 97);
    assert_eq!(detail.analysis_id.as_deref(), Some("a-1"));
    // The list projection carries no audio metadata, so the detail view
    // degrades those fields to placeholders.
    assert_eq!(detail.duration, "Unknown");
    assert_eq!(detail.details.len(), 1);
}

#[test]
fn history_detail_tests_fetch_unknown_entries_from_backend() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let history = Arc::new(common::MockHistoryTransport::answering(
        &common::fixture_history_body(),
    ));
    let mut runtime = common::fixture_runtime(
        dir.path(),
        Arc::new(common::MockAuthTransport::default()),
        Arc::new(common::RecordingUploadTransport::answering("{}")),
        Arc::clone(&history),
    );
    runtime
        .login("ana@example.test", "secret")
        .expect("login should succeed");

    // No list fetch happened, so the id is unknown locally and the detail
    // comes from the backend payload.
    let detail = runtime
        .history_detail("a-404")
        .expect("detail should fetch");

    assert!(!detail.is_ai);
    assert_eq!(detail.confidence, 50);
}
