//! Integration tests for runtime status projection.

use vocal_guard_app::project_runtime_status;
use vocal_guard_ui::{StageStatus, UiAuthState, UiState};

#[test]
fn runtime_status_projection_tests_reflects_ui_state() {
    let mut state = UiState::new("v0.1.0");
    state.auth = UiAuthState::Authenticated;
    state.selected_file = Some("clip.wav".to_string());
    state.upload = StageStatus::Healthy;
    state.history = StageStatus::Degraded;
    state.status_message = "clip.wav: AI Generated (87% confidence)".to_string();

    let snapshot = project_runtime_status(&state);
    assert!(snapshot.upload_allowed);
    assert_eq!(snapshot.auth, "Authenticated");
    assert_eq!(snapshot.upload, "Healthy");
    assert_eq!(snapshot.history, "Degraded");
    assert_eq!(snapshot.status, "clip.wav: AI Generated (87% confidence)");
}

#[test]
fn runtime_status_projection_tests_blocks_submit_while_running() {
    let mut state = UiState::new("v0.1.0");
    state.auth = UiAuthState::Authenticated;
    state.selected_file = Some("clip.wav".to_string());
    state.upload = StageStatus::Running;

    let snapshot = project_runtime_status(&state);
    assert!(!snapshot.upload_allowed);
}
