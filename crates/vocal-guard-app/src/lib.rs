#![warn(missing_docs)]
//! # vocal-guard-app
//!
//! ## Purpose
//! Orchestrates auth, session lifecycle, upload, history, and UI state for
//! `vocal-guard`.
//!
//! ## Responsibilities
//! - Resolve runtime configuration from the environment.
//! - Wire the crate clients together and drive the user-visible flows.
//! - Discard in-flight results whose originating session is gone.
//! - Provide per-run file logging with secret redaction and the runtime
//!   status projection consumed by the shell.
//!
//! ## Data flow
//! Startup restore + verification -> route-guarded navigation -> file
//! submission through validation/upload/normalization -> history list and
//! bulk-delete reconciliation -> UI status projection.
//!
//! ## Ownership and lifetimes
//! The runtime owns the UI state and history view; the session manager is
//! shared behind `Arc` so transports and tests can observe transitions.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. No failure is fatal:
//! every flow resolves to a visible message and an interactive state, and
//! nothing retries automatically.
//!
//! ## Security and privacy notes
//! - Submissions are blocked by the `VOCALGUARD_UPLOAD_ENABLED` kill switch.
//! - Log redaction helpers strip token/credential strings before any line is
//!   written.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use vocal_guard_analysis_contract::{AnalysisResult, normalize};
use vocal_guard_auth::{AuthClient, AuthError, AuthTransport, Credentials, SignupRequest};
use vocal_guard_core::{AudioFile, Session};
use vocal_guard_history::{HistoryClient, HistoryError, HistoryTransport, HistoryView};
use vocal_guard_session::{
    InitializeOutcome, ProfileUpdate, SessionError, SessionHandle, SessionManager, SessionStore,
};
use vocal_guard_ui::{StageStatus, UiState, View};
use vocal_guard_upload::{
    AnalysisMode, FailureClass, SubmissionGate, SubmissionState, UploadClient, UploadError,
    UploadTransport, classify_upload_error, user_facing_message, validate_audio_file,
};

/// Build-time application version loaded from the root `VERSION` file.
pub const APP_VERSION: &str = env!("VOCALGUARD_VERSION");

/// Default backend base URL used when no override is configured.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Runtime configuration resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Validated backend base URL.
    pub api_base_url: String,
    /// Directory holding the durable session record and run logs.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Resolves configuration from `VOCALGUARD_API_BASE` and
    /// `VOCALGUARD_DATA_DIR`, falling back to the defaults.
    ///
    /// # Errors
    /// Returns [`AppError::Auth`] when the configured base URL violates
    /// endpoint policy.
    pub fn from_env() -> Result<Self, AppError> {
        let api_base_url = std::env::var("VOCALGUARD_API_BASE")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        vocal_guard_auth::validate_api_base(&api_base_url)?;

        let data_dir = std::env::var("VOCALGUARD_DATA_DIR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            api_base_url,
            data_dir,
        })
    }
}

/// Returns the platform data directory for vocal-guard.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "vocal-guard")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".vocal-guard"))
}

/// Checks the runtime upload kill-switch env var.
///
/// Semantics:
/// - Unset => uploads enabled.
/// - `0`, `false`, `off` (case-insensitive) => uploads disabled.
/// - Any other value => uploads enabled.
pub fn upload_enabled_from_env() -> bool {
    match std::env::var("VOCALGUARD_UPLOAD_ENABLED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Redacts common secret markers in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for key in ["password", "token", "authorization", "bearer"] {
        redacted = redact_key_value(&redacted, key);
    }
    redacted
}

fn redact_key_value(input: &str, key: &str) -> String {
    let lower = input.to_ascii_lowercase();
    if let Some(position) = lower.find(key) {
        let prefix = &input[..position];
        return format!("{prefix}{key}=<redacted>");
    }

    input.to_string()
}

/// Returns the current Unix time in milliseconds.
pub fn unix_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis() as u64)
}

/// Append-only per-run file logger.
///
/// Lines follow `timestamp_ms | LEVEL | stage | action | detail`; the detail
/// column passes through [`redact_sensitive`] before it is written.
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Creates a run log file under `dir`.
    ///
    /// # Errors
    /// Returns [`AppError::Logging`] when the directory or file cannot be
    /// created.
    pub fn new(dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(dir)
            .map_err(|error| AppError::Logging(format!("log directory create failed: {error}")))?;

        let path = dir.join(format!("run_{}_log.txt", unix_timestamp_millis()));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| {
                AppError::Logging(format!(
                    "unable to create log file '{}': {error}",
                    path.display()
                ))
            })?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one INFO line.
    pub fn info(&self, stage: &str, action: &str, detail: &str) {
        self.write_line("INFO", stage, action, detail);
    }

    /// Writes one ERROR line and flushes.
    pub fn error(&self, stage: &str, action: &str, detail: &str) {
        self.write_line("ERROR", stage, action, detail);
    }

    fn write_line(&self, level: &str, stage: &str, action: &str, detail: &str) {
        let detail = redact_sensitive(detail);
        let line = format!(
            "{} | {level} | {stage} | {action} | {detail}\n",
            unix_timestamp_millis()
        );

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
            if level == "ERROR" {
                let _ = file.flush();
            }
        }
    }
}

/// Snapshot of the session generation taken when a request starts.
///
/// Every resolution checks relevance before mutating shared state, so a
/// result whose originating session or view is gone is discarded without
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceTicket {
    generation: u64,
}

impl RelevanceTicket {
    /// Captures the current session generation.
    pub fn capture(handle: &SessionHandle) -> Self {
        Self {
            generation: handle.generation(),
        }
    }

    /// Returns `true` when no session transition happened since capture.
    pub fn is_still_relevant(&self, handle: &SessionHandle) -> bool {
        handle.generation() == self.generation
    }
}

/// Outcome of a fetch whose result may have outlived its originating view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was applied to local state; carries the entry count.
    Applied(usize),
    /// A session transition happened while the request was in flight; the
    /// result was discarded and local state is untouched.
    Discarded,
}

/// Consolidated runtime status snapshot for simple UI projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    /// Whether session/selection/kill-switch gates currently allow submit.
    pub upload_allowed: bool,
    /// Auth status as human-readable string.
    pub auth: String,
    /// Upload stage status.
    pub upload: String,
    /// History stage status.
    pub history: String,
    /// Status line for the active flow.
    pub status: String,
}

/// Projects UI runtime state into a flat status snapshot.
pub fn project_runtime_status(state: &UiState) -> RuntimeStatus {
    RuntimeStatus {
        upload_allowed: state.can_submit() && upload_enabled_from_env(),
        auth: format!("{:?}", state.auth),
        upload: format!("{:?}", state.upload),
        history: format!("{:?}", state.history),
        status: state.status_message.clone(),
    }
}

/// Wired application runtime driving all user-visible flows.
pub struct AppRuntime {
    config: AppConfig,
    manager: Arc<SessionManager>,
    auth_client: AuthClient,
    upload_client: UploadClient,
    history_client: HistoryClient,
    gate: SubmissionGate,
    history_view: HistoryView,
    ui: UiState,
    last_result: Option<AnalysisResult>,
}

impl AppRuntime {
    /// Wires the runtime from configuration and transport implementations.
    ///
    /// # Errors
    /// Returns [`AppError`] when the configured base URL fails a client's
    /// endpoint policy.
    pub fn new(
        config: AppConfig,
        auth_transport: Arc<dyn AuthTransport>,
        upload_transport: Arc<dyn UploadTransport>,
        history_transport: Arc<dyn HistoryTransport>,
    ) -> Result<Self, AppError> {
        let auth_client = AuthClient::new(config.api_base_url.clone(), auth_transport)?;
        let upload_client = UploadClient::new(config.api_base_url.clone(), upload_transport)?;
        let history_client = HistoryClient::new(config.api_base_url.clone(), history_transport)?;
        let manager = Arc::new(SessionManager::new(SessionStore::new(&config.data_dir)));

        Ok(Self {
            config,
            manager,
            auth_client,
            upload_client,
            history_client,
            gate: SubmissionGate::new(),
            history_view: HistoryView::new(),
            ui: UiState::new(app_version()),
            last_result: None,
        })
    }

    /// Restores persisted session state and reconciles it with the backend.
    ///
    /// A restored session becomes active before the verification call so the
    /// UI renders without waiting on network; a failed verification flags the
    /// session instead of clearing it.
    ///
    /// # Errors
    /// Returns [`AppError::Session`] only for store failures while discarding
    /// an expired record.
    pub fn startup(&mut self, now_ms: u64) -> Result<InitializeOutcome, AppError> {
        let outcome = self.manager.initialize(now_ms)?;
        if outcome == InitializeOutcome::Restored {
            let _ = self.manager.verify_active_session(&self.auth_client);
        }
        self.sync_auth_projection();
        Ok(outcome)
    }

    /// Logs in with credentials and replaces the active session.
    ///
    /// # Errors
    /// Returns [`AppError::Auth`] for rejected credentials or a response
    /// missing token/user id, and [`AppError::Session`] for store failures.
    pub fn login(&mut self, email: &str, password: &str) -> Result<Session, AppError> {
        let session = self.auth_client.login(&Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        self.manager.login(session.clone())?;
        self.sync_auth_projection();
        Ok(session)
    }

    /// Creates an account and replaces the active session.
    ///
    /// # Errors
    /// Same contract as [`AppRuntime::login`].
    pub fn signup(&mut self, email: &str, password: &str, username: &str) -> Result<Session, AppError> {
        let session = self.auth_client.signup(&SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            username: username.to_string(),
        })?;

        self.manager.login(session.clone())?;
        self.sync_auth_projection();
        Ok(session)
    }

    /// Clears the active session and persisted record. Idempotent.
    ///
    /// # Errors
    /// Returns [`AppError::Session`] when removing the record fails.
    pub fn logout(&mut self) -> Result<(), AppError> {
        self.manager.logout()?;
        self.sync_auth_projection();
        Ok(())
    }

    /// Merges profile fields into the active session and re-persists.
    ///
    /// # Errors
    /// Returns [`AppError::Session`] with `NoActiveSession` while logged out.
    pub fn update_profile(
        &mut self,
        username: Option<String>,
        email: Option<String>,
    ) -> Result<Session, AppError> {
        let updated = self.manager.update_profile(ProfileUpdate { username, email })?;
        self.sync_auth_projection();
        Ok(updated)
    }

    /// Changes the account password through the auth backend.
    ///
    /// Session fields are not mutated; the token stays as issued.
    ///
    /// # Errors
    /// Returns [`AppError::Session`] while logged out and [`AppError::Auth`]
    /// for backend rejections.
    pub fn change_password(&mut self, current: &str, replacement: &str) -> Result<(), AppError> {
        let session = self
            .manager
            .current()
            .ok_or(SessionError::NoActiveSession)?;

        // A rejection here can mean a mistyped current password just as well
        // as a stale token, so it never tears the session down.
        self.auth_client
            .change_password(&session.token, current, replacement)?;
        Ok(())
    }

    /// Requests a password reset email. Fire-and-forget; no session mutation.
    ///
    /// # Errors
    /// Returns [`AppError::Auth`] for a blank email or transport failure.
    pub fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        self.auth_client.forgot_password(email)?;
        Ok(())
    }

    /// Navigates to a view through the route guard.
    ///
    /// Returns the view that actually rendered.
    pub fn navigate(&mut self, requested: View) -> View {
        let session = self.manager.current();
        self.ui.navigate(requested, session.as_ref())
    }

    /// Records a new file selection; returns the submission flow to idle.
    pub fn select_file(&mut self, file: &AudioFile) {
        self.gate.reset();
        self.ui.select_file(file.file_name.clone());
    }

    /// Drives one file through validation, submission, and normalization.
    ///
    /// Exactly one submission can be in flight; the gate refuses re-entry and
    /// the UI disables the submit control while the upload stage runs. A
    /// session transition during the request discards the result without
    /// mutating the previously displayed one.
    ///
    /// # Errors
    /// Returns [`AppError::UploadDisabled`] when the kill switch is off,
    /// [`AppError::Upload`] for policy/transport failures, and
    /// [`AppError::Session`] when no session is active. An auth-class
    /// rejection additionally tears the session down.
    pub fn submit(&mut self, file: &AudioFile, mode: AnalysisMode) -> Result<AnalysisResult, AppError> {
        if !upload_enabled_from_env() {
            return Err(AppError::UploadDisabled);
        }

        self.gate.begin_validation()?;

        let Some(session) = self.manager.current() else {
            self.gate.reset();
            return Err(AppError::Session(SessionError::NoActiveSession));
        };

        if let Err(error) = validate_audio_file(file) {
            self.gate.mark_invalid()?;
            self.ui.apply_failure(user_facing_message(&error));
            return Err(AppError::Upload(error));
        }

        self.gate.begin_submitting()?;
        self.ui.upload = StageStatus::Running;
        let ticket = RelevanceTicket::capture(&self.manager.handle());

        match self.upload_client.submit(file, &session.token, mode) {
            Ok(raw) => {
                self.gate.begin_normalizing()?;
                let result = normalize(&raw);
                self.gate.complete()?;

                if ticket.is_still_relevant(&self.manager.handle()) {
                    self.ui.apply_result(&result);
                    self.last_result = Some(result.clone());
                } else {
                    self.ui.upload = StageStatus::Idle;
                }
                Ok(result)
            }
            Err(error) => {
                self.gate.fail()?;
                if ticket.is_still_relevant(&self.manager.handle()) {
                    self.ui.apply_failure(user_facing_message(&error));
                }
                if classify_upload_error(&error) == FailureClass::Auth {
                    self.manager.note_request_auth_failure()?;
                    self.sync_auth_projection();
                }
                Err(AppError::Upload(error))
            }
        }
    }

    /// Fetches the stored analyses and replaces the history view contents.
    ///
    /// A session transition while the fetch is in flight discards the result:
    /// local history state and the session stay untouched.
    ///
    /// # Errors
    /// Returns [`AppError::Session`] while logged out and
    /// [`AppError::History`] for transport failures; an auth-class rejection
    /// additionally tears the session down.
    pub fn refresh_history(&mut self) -> Result<FetchOutcome, AppError> {
        let Some(session) = self.manager.current() else {
            return Err(AppError::Session(SessionError::NoActiveSession));
        };

        let ticket = RelevanceTicket::capture(&self.manager.handle());
        self.ui.history = StageStatus::Running;

        match self.history_client.list(&session.token) {
            Ok(entries) => {
                if !ticket.is_still_relevant(&self.manager.handle()) {
                    self.ui.history = StageStatus::Idle;
                    return Ok(FetchOutcome::Discarded);
                }

                let count = entries.len();
                self.history_view.set_entries(entries);
                self.ui.history = StageStatus::Healthy;
                Ok(FetchOutcome::Applied(count))
            }
            Err(error) => {
                if ticket.is_still_relevant(&self.manager.handle()) {
                    self.ui.history = StageStatus::Degraded;
                    self.ui.status_message = history_user_message(&error);
                }
                if error.is_auth_failure() {
                    self.manager.note_request_auth_failure()?;
                    self.sync_auth_projection();
                }
                Err(AppError::History(error))
            }
        }
    }

    /// Deletes the selected history entries on the backend, then reconciles.
    ///
    /// Local entries are removed only after server confirmation; on failure
    /// local history state is unchanged and an error message is shown.
    ///
    /// # Errors
    /// Returns [`AppError::Session`] while logged out and
    /// [`AppError::History`] for transport failures.
    pub fn delete_selected_history(&mut self) -> Result<usize, AppError> {
        let ids = self.history_view.selected_ids();
        if ids.is_empty() {
            return Ok(0);
        }

        let Some(session) = self.manager.current() else {
            return Err(AppError::Session(SessionError::NoActiveSession));
        };

        match self.history_client.delete(&session.token, &ids) {
            Ok(()) => {
                self.history_view.apply_delete(&ids);
                self.ui.history = StageStatus::Healthy;
                Ok(ids.len())
            }
            Err(error) => {
                self.ui.history = StageStatus::Degraded;
                self.ui.status_message = history_user_message(&error);
                if error.is_auth_failure() {
                    self.manager.note_request_auth_failure()?;
                    self.sync_auth_projection();
                }
                Err(AppError::History(error))
            }
        }
    }

    /// Produces the detail-view record for one stored analysis.
    ///
    /// Entries already known to the history view are reconstructed locally;
    /// unknown ids are fetched from the backend.
    ///
    /// # Errors
    /// Returns [`AppError::Session`] while logged out and
    /// [`AppError::History`] for transport failures on the fetch path.
    pub fn history_detail(&mut self, analysis_id: &str) -> Result<AnalysisResult, AppError> {
        if let Some(entry) = self
            .history_view
            .entries()
            .iter()
            .find(|entry| entry.analysis_id == analysis_id)
        {
            return Ok(AnalysisResult::from_history_entry(entry));
        }

        let Some(session) = self.manager.current() else {
            return Err(AppError::Session(SessionError::NoActiveSession));
        };

        match self.history_client.fetch(&session.token, analysis_id) {
            Ok(result) => Ok(result),
            Err(error) => {
                if error.is_auth_failure() {
                    self.manager.note_request_auth_failure()?;
                    self.sync_auth_projection();
                }
                Err(AppError::History(error))
            }
        }
    }

    /// Returns the shared session manager.
    pub fn manager(&self) -> Arc<SessionManager> {
        Arc::clone(&self.manager)
    }

    /// Returns the current UI state snapshot.
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Returns the history view state.
    pub fn history_view(&self) -> &HistoryView {
        &self.history_view
    }

    /// Returns mutable history view state for selection/filter events.
    pub fn history_view_mut(&mut self) -> &mut HistoryView {
        &mut self.history_view
    }

    /// Returns the current submission gate state.
    pub fn submission_state(&self) -> SubmissionState {
        self.gate.state()
    }

    /// Returns the most recently applied analysis result.
    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn sync_auth_projection(&mut self) {
        let handle = self.manager.handle();
        let session = handle.snapshot();
        let flagged = handle.auth_warning().is_some();
        self.ui.apply_session(session.as_ref(), flagged);
    }
}

/// Builds the message surfaced to the user for a failed history request.
///
/// Backend detail strings pass through verbatim; everything else falls back
/// to a stable generic message.
pub fn history_user_message(error: &HistoryError) -> String {
    match error {
        HistoryError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
        HistoryError::Unauthorized(message) if !message.trim().is_empty() => message.clone(),
        HistoryError::Network(_) => {
            "Could not reach the analysis service. Check your connection and try again.".to_string()
        }
        _ => "History request failed. Please try again.".to_string(),
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Auth subsystem error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    /// Session store/lifecycle error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    /// Upload policy or transport error.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    /// History transport or contract error.
    #[error("history error: {0}")]
    History(#[from] HistoryError),
    /// Submissions are blocked by the runtime kill switch.
    #[error("uploads are disabled by VOCALGUARD_UPLOAD_ENABLED")]
    UploadDisabled,
    /// Run logger setup failure.
    #[error("logging failure: {0}")]
    Logging(String),
}
