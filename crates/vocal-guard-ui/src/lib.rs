#![warn(missing_docs)]
//! # vocal-guard-ui
//!
//! ## Purpose
//! Defines the UI-facing runtime state model for `vocal-guard`: the view
//! catalogue, the route guard, and display-safe status projection.
//!
//! ## Responsibilities
//! - Enumerate application views and mark the identity-requiring set.
//! - Gate protected views on session presence, synchronously, on every
//!   render.
//! - Represent auth, upload, and history stage statuses for the shell.
//! - Project normalized analysis results into display text.
//!
//! ## Data flow
//! App orchestration events mutate [`UiState`]; every render consults
//! [`authorize`] with the current session snapshot before drawing a view.
//!
//! ## Ownership and lifetimes
//! `UiState` owns all string/status values to simplify event reducers.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. The guard is a
//! pure function: it has no knowledge of why a session might be absent.
//!
//! ## Security and privacy notes
//! UI state intentionally excludes secrets (credentials, tokens, raw bytes).

use vocal_guard_analysis_contract::AnalysisResult;
use vocal_guard_core::Session;

/// Application views reachable from the navigation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Marketing landing page.
    Home,
    /// Static product information page.
    About,
    /// Credential entry.
    Login,
    /// Account creation.
    Signup,
    /// Password reset request.
    ForgotPassword,
    /// File selection and submission.
    Upload,
    /// Latest analysis result.
    Result,
    /// Stored analysis list.
    History,
    /// Single stored analysis.
    AnalysisDetail,
    /// Account settings.
    Profile,
}

impl View {
    /// Returns `true` when this view must never render without a session.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            View::Upload | View::Result | View::History | View::AnalysisDetail | View::Profile
        )
    }
}

/// Outcome of a route authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The requested view may render.
    Render(View),
    /// The requested view is protected and no session exists; the login view
    /// renders instead and nothing of the protected view is produced.
    RedirectToLogin,
}

/// Gates a view on current session presence.
///
/// Pure and synchronous; callers re-evaluate on every render and on every
/// session change, so a logout with a protected view mounted redirects on
/// the next evaluation.
pub fn authorize(view: View, session: Option<&Session>) -> RouteDecision {
    if view.requires_session() && session.is_none() {
        return RouteDecision::RedirectToLogin;
    }
    RouteDecision::Render(view)
}

/// Resolves the view that actually renders for a navigation target.
pub fn resolve_view(requested: View, session: Option<&Session>) -> View {
    match authorize(requested, session) {
        RouteDecision::Render(view) => view,
        RouteDecision::RedirectToLogin => View::Login,
    }
}

/// UI-auth state projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAuthState {
    /// No session exists.
    Unauthenticated,
    /// A session is active and unflagged.
    Authenticated,
    /// A session is active but background verification flagged it.
    AuthenticatedWithWarning,
}

/// Generic stage status used for the upload and history flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage has not started.
    Idle,
    /// Stage is currently running; its triggering control is disabled.
    Running,
    /// Stage completed successfully.
    Healthy,
    /// Stage encountered a non-fatal error.
    Degraded,
}

/// Aggregate UI runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Current auth status projection.
    pub auth: UiAuthState,
    /// View currently rendered.
    pub active_view: View,
    /// File name selected for upload, when any.
    pub selected_file: Option<String>,
    /// Upload/submission stage status.
    pub upload: StageStatus,
    /// History fetch/delete stage status.
    pub history: StageStatus,
    /// Human-readable status line for the active flow.
    pub status_message: String,
}

impl UiState {
    /// Creates default UI state on the home view.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            auth: UiAuthState::Unauthenticated,
            active_view: View::Home,
            selected_file: None,
            upload: StageStatus::Idle,
            history: StageStatus::Idle,
            status_message: "No analysis yet".to_string(),
        }
    }

    /// Projects the current session snapshot into the auth status.
    pub fn apply_session(&mut self, session: Option<&Session>, flagged: bool) {
        self.auth = match (session, flagged) {
            (None, _) => UiAuthState::Unauthenticated,
            (Some(_), false) => UiAuthState::Authenticated,
            (Some(_), true) => UiAuthState::AuthenticatedWithWarning,
        };
    }

    /// Navigates to a target view through the route guard.
    ///
    /// Returns the view that actually rendered.
    pub fn navigate(&mut self, requested: View, session: Option<&Session>) -> View {
        self.active_view = resolve_view(requested, session);
        self.active_view
    }

    /// Records a file selection and returns the submission flow to idle.
    pub fn select_file(&mut self, file_name: impl Into<String>) {
        self.selected_file = Some(file_name.into());
        self.upload = StageStatus::Idle;
    }

    /// Returns `true` when the submit control should be enabled.
    ///
    /// The control stays disabled while a submission is running so a second
    /// concurrent request for the same selection cannot be triggered.
    pub fn can_submit(&self) -> bool {
        self.auth != UiAuthState::Unauthenticated
            && self.selected_file.is_some()
            && self.upload != StageStatus::Running
    }

    /// Projects a normalized result into the status line.
    pub fn apply_result(&mut self, result: &AnalysisResult) {
        self.upload = StageStatus::Healthy;
        self.status_message = verdict_banner(result);
    }

    /// Records a flow failure message without touching any prior result view.
    pub fn apply_failure(&mut self, message: impl Into<String>) {
        self.upload = StageStatus::Degraded;
        self.status_message = message.into();
    }
}

/// Builds the one-line verdict banner for a normalized result.
pub fn verdict_banner(result: &AnalysisResult) -> String {
    let verdict = if result.is_ai {
        "AI Generated"
    } else {
        "Human Voice"
    };
    format!(
        "{}: {verdict} ({}% confidence)",
        result.filename, result.confidence
    )
}

#[cfg(test)]
mod tests {
    //! Unit tests for route gating and submit enablement.

    use super::*;

    fn fixture_session() -> Session {
        Session::new("token", "uid-1", Some("ana".to_string()), None)
            .expect("session should build")
    }

    #[test]
    fn protected_views_redirect_without_session() {
        for view in [
            View::Upload,
            View::Result,
            View::History,
            View::AnalysisDetail,
            View::Profile,
        ] {
            assert_eq!(authorize(view, None), RouteDecision::RedirectToLogin);
        }
    }

    #[test]
    fn public_views_render_without_session() {
        assert_eq!(authorize(View::Home, None), RouteDecision::Render(View::Home));
        assert_eq!(
            authorize(View::Login, None),
            RouteDecision::Render(View::Login)
        );
    }

    #[test]
    fn session_change_is_observed_on_next_navigation() {
        let mut state = UiState::new("v0.1.0");
        let session = fixture_session();

        assert_eq!(state.navigate(View::History, Some(&session)), View::History);
        assert_eq!(state.navigate(View::History, None), View::Login);
    }

    #[test]
    fn submit_control_disabled_while_running() {
        let mut state = UiState::new("v0.1.0");
        state.apply_session(Some(&fixture_session()), false);
        state.select_file("clip.wav");
        assert!(state.can_submit());

        state.upload = StageStatus::Running;
        assert!(!state.can_submit());
    }
}
