//! Integration tests for bulk-delete reconciliation.

mod common;

use std::sync::Arc;

#[test]
fn history_bulk_delete_tests_remove_confirmed_ids_and_clear_selection() {
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
    runtime.refresh_history().expect("fetch should succeed");

    runtime.history_view_mut().toggle_selection("a-1");
    let deleted = runtime
        .delete_selected_history()
        .expect("delete should succeed");

    assert_eq!(deleted, 1);
    assert_eq!(history.delete_calls(), vec![vec!["a-1".to_string()]]);
    let remaining: Vec<String> = runtime
        .history_view()
        .entries()
        .iter()
        .map(|entry| entry.analysis_id.clone())
        .collect();
    assert_eq!(remaining, vec!["a-2"]);
    assert_eq!(runtime.history_view().selected_count(), 0);
}

#[test]
fn history_bulk_delete_tests_failed_delete_leaves_local_state_unchanged() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let mut history = common::MockHistoryTransport::answering(&common::fixture_history_body());
    history.delete_fail_status = Some(500);
    let history = Arc::new(history);

    let mut runtime = common::fixture_runtime(
        dir.path(),
        Arc::new(common::MockAuthTransport::default()),
        Arc::new(common::RecordingUploadTransport::answering("{}")),
        Arc::clone(&history),
    );
    runtime
        .login("ana@example.test", "secret")
        .expect("login should succeed");
    runtime.refresh_history().expect("fetch should succeed");

    runtime.history_view_mut().toggle_selection("a-1");
    runtime.history_view_mut().toggle_selection("a-2");
    let error = runtime.delete_selected_history().unwrap_err();

    assert!(error.to_string().contains("delete rejected"));
    assert_eq!(runtime.history_view().entries().len(), 2);
    assert_eq!(runtime.history_view().selected_count(), 2);
    assert_eq!(runtime.ui().status_message, "delete rejected");
}

#[test]
fn history_bulk_delete_tests_empty_selection_is_a_local_no_op() {
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

    let deleted = runtime
        .delete_selected_history()
        .expect("empty delete should be a no-op");

    assert_eq!(deleted, 0);
    assert!(history.delete_calls().is_empty());
}
