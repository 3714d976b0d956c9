#![warn(missing_docs)]
//! # vocal-guard-session
//!
//! ## Purpose
//! Owns the authoritative client session for `vocal-guard`: durable storage,
//! lifecycle transitions, and the observable handle consumed by the route
//! guard and request flows.
//!
//! ## Responsibilities
//! - Persist and restore the session record across process restarts.
//! - Decide session validity at startup from the token's embedded expiry.
//! - Apply login/logout/profile-update mutations and keep the in-memory and
//!   persisted copies consistent on every mutation.
//! - Expose session state through a generation-counted shared handle so no
//!   consumer reads a stale session across a transition.
//!
//! ## Data flow
//! [`SessionStore::load`] -> [`SessionManager::initialize`] -> active session
//! observable via [`SessionHandle`] -> mutations (`login`, `logout`,
//! `update_profile`, auth-failure teardown) re-persist through the store.
//!
//! ## Ownership and lifetimes
//! The manager exclusively owns store access; all other components hold
//! read-only [`SessionHandle`] clones.
//!
//! ## Error model
//! Storage and codec failures surface as [`SessionError`]; a corrupt or
//! partial persisted record degrades to the unauthenticated state instead of
//! failing startup.
//!
//! ## Security and privacy notes
//! Expiry decoding is a UX optimization; the backend verify endpoint stays
//! authoritative. A failed background verification flags the session rather
//! than clearing it, and teardown happens on the next rejected request.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use vocal_guard_auth::{AuthClient, AuthError, is_token_expired};
use vocal_guard_core::{Session, SessionRecord};

/// File name of the durable session record inside the data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Durable store for the flat session record.
///
/// The record is written as one JSON document, so readers never observe a
/// partially written session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(SESSION_FILE_NAME),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted session, if a complete one exists.
    ///
    /// # Semantics
    /// Returns `Some` only when the record decodes and carries non-empty
    /// `token` and `userId` fields. A missing file, unreadable bytes, or a
    /// partial record all read as absent; startup must not fail on a corrupt
    /// store. No side effects beyond the read.
    pub fn load(&self) -> Option<Session> {
        let raw = fs::read(&self.path).ok()?;
        let record = SessionRecord::from_json_bytes(&raw).ok()?;
        Session::from_record(&record).ok()
    }

    /// Writes all session fields as one serialized record.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] when the directory cannot be created
    /// or the write fails.
    pub fn persist(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| SessionError::Store(error.to_string()))?;
        }

        let bytes = session
            .to_record()
            .to_json_bytes()
            .map_err(|error| SessionError::Store(error.to_string()))?;
        fs::write(&self.path, bytes).map_err(|error| SessionError::Store(error.to_string()))
    }

    /// Removes the persisted record. Safe to call when nothing is persisted.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] for I/O failures other than a missing
    /// file.
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(SessionError::Store(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct SharedSessionState {
    session: Option<Session>,
    generation: u64,
    auth_warning: Option<String>,
}

/// Read-only observable view of the active session.
///
/// Every lifecycle transition bumps the generation counter before the
/// mutating call returns, so consumers comparing generations can detect that
/// a result produced under an older session is stale.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<SharedSessionState>>,
}

impl SessionHandle {
    /// Returns a snapshot of the active session.
    pub fn snapshot(&self) -> Option<Session> {
        self.read_state().session.clone()
    }

    /// Returns `true` when a session is currently active.
    pub fn is_authenticated(&self) -> bool {
        self.read_state().session.is_some()
    }

    /// Returns the transition counter value.
    pub fn generation(&self) -> u64 {
        self.read_state().generation
    }

    /// Returns the recoverable auth warning recorded by a failed background
    /// verification, if any.
    pub fn auth_warning(&self) -> Option<String> {
        self.read_state().auth_warning.clone()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SharedSessionState> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SharedSessionState> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Outcome of the startup restore step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeOutcome {
    /// No usable persisted session existed.
    Unauthenticated,
    /// A persisted session was restored and is active.
    Restored,
    /// A persisted session carried a past expiry and was discarded; the
    /// store was cleared.
    DiscardedExpired,
}

/// Outcome of the server-side token reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// No session was active, so nothing was verified.
    NoSession,
    /// The backend accepted the token.
    Verified,
    /// Verification failed; a recoverable warning was recorded and the
    /// session stays active until a real request is rejected.
    Flagged(String),
}

/// Partial profile mutation applied to the active session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Replacement display name, when changed.
    pub username: Option<String>,
    /// Replacement email, when changed.
    pub email: Option<String>,
}

/// Session lifecycle manager; the only component permitted to mutate the
/// active session or touch the store.
#[derive(Debug)]
pub struct SessionManager {
    store: SessionStore,
    handle: SessionHandle,
}

impl SessionManager {
    /// Creates a manager over `store` with an empty active session.
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            handle: SessionHandle::default(),
        }
    }

    /// Returns a read-only handle for guards and request flows.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Returns a snapshot of the active session.
    pub fn current(&self) -> Option<Session> {
        self.handle.snapshot()
    }

    /// Restores persisted state at startup.
    ///
    /// A candidate whose token embeds a past expiry is discarded and the
    /// store is cleared; the manager starts unauthenticated. Otherwise the
    /// candidate becomes active immediately so the UI does not wait on
    /// network reconciliation. Pure of network I/O.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] only when clearing an expired record
    /// fails.
    pub fn initialize(&self, now_ms: u64) -> Result<InitializeOutcome, SessionError> {
        let Some(candidate) = self.store.load() else {
            return Ok(InitializeOutcome::Unauthenticated);
        };

        if is_token_expired(&candidate.token, now_ms) {
            self.store.clear()?;
            self.transition(|state| {
                state.session = None;
            });
            return Ok(InitializeOutcome::DiscardedExpired);
        }

        self.transition(|state| {
            state.session = Some(candidate);
        });
        Ok(InitializeOutcome::Restored)
    }

    /// Reconciles the restored session against the backend verify endpoint.
    ///
    /// A rejected or unreachable verification records a recoverable warning
    /// but does not clear the session, avoiding a logged-out flash at
    /// startup; teardown happens via [`SessionManager::note_request_auth_failure`]
    /// when a real request is rejected.
    pub fn verify_active_session(&self, client: &AuthClient) -> VerificationOutcome {
        let Some(session) = self.handle.snapshot() else {
            return VerificationOutcome::NoSession;
        };

        match client.verify_token(&session.token) {
            Ok(()) => {
                self.transition(|state| {
                    state.auth_warning = None;
                });
                VerificationOutcome::Verified
            }
            Err(error) => {
                let warning = verification_warning(&error);
                self.transition(|state| {
                    state.auth_warning = Some(warning.clone());
                });
                VerificationOutcome::Flagged(warning)
            }
        }
    }

    /// Replaces the active session after a successful login or signup.
    ///
    /// Persists all fields in one write and clears any prior auth warning.
    /// Navigation is a caller concern.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] when persistence fails; the in-memory
    /// session is not replaced in that case.
    pub fn login(&self, session: Session) -> Result<(), SessionError> {
        self.store.persist(&session)?;
        self.transition(|state| {
            state.session = Some(session);
            state.auth_warning = None;
        });
        Ok(())
    }

    /// Clears the active session and the persisted record unconditionally.
    /// Idempotent.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] when removing the record fails; the
    /// in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.transition(|state| {
            state.session = None;
            state.auth_warning = None;
        });
        self.store.clear()
    }

    /// Merges profile fields into the active session and re-persists.
    ///
    /// The token and user id are immutable once issued; only `username` and
    /// `email` move. Password change is a distinct backend call that never
    /// passes through here.
    ///
    /// # Errors
    /// Returns [`SessionError::NoActiveSession`] while unauthenticated and
    /// [`SessionError::Store`] when re-persisting fails.
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<Session, SessionError> {
        let current = self
            .handle
            .snapshot()
            .ok_or(SessionError::NoActiveSession)?;

        let email = update
            .email
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or(current.email);
        let username = update
            .username
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(current.username);

        let updated = Session::new(
            current.token,
            current.user_id,
            Some(username),
            email.as_deref(),
        )?;

        self.store.persist(&updated)?;
        self.transition(|state| {
            state.session = Some(updated.clone());
        });
        Ok(updated)
    }

    /// Tears the session down after a bearer-authenticated request was
    /// rejected with an auth-class failure.
    ///
    /// This is the lazy-invalidation path paired with
    /// [`SessionManager::verify_active_session`]. Idempotent.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] when clearing the record fails.
    pub fn note_request_auth_failure(&self) -> Result<(), SessionError> {
        self.transition(|state| {
            state.session = None;
            state.auth_warning = Some("session expired; please log in again".to_string());
        });
        self.store.clear()
    }

    fn transition(&self, apply: impl FnOnce(&mut SharedSessionState)) {
        let mut state = self.handle.write_state();
        apply(&mut state);
        // Consumers compare generations to detect transitions, so the bump
        // must land in the same critical section as the mutation.
        state.generation = state.generation.saturating_add(1);
    }
}

fn verification_warning(error: &AuthError) -> String {
    if error.is_credential_rejection() {
        "stored session was rejected by the server".to_string()
    } else {
        format!("session verification unavailable: {error}")
    }
}

/// Errors produced by session storage and lifecycle logic.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A mutation required an active session.
    #[error("no active session")]
    NoActiveSession,
    /// Durable storage failure.
    #[error("session store failure: {0}")]
    Store(String),
    /// Session model violation while applying a mutation.
    #[error("session model failure: {0}")]
    Model(#[from] vocal_guard_core::CoreError),
}
