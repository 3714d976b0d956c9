#![warn(missing_docs)]
//! # vocal-guard-upload
//!
//! ## Purpose
//! Drives exactly one user-selected audio file through validation,
//! submission, and response intake for `vocal-guard`.
//!
//! ## Responsibilities
//! - Enforce the upload policy (declared-type allow-list, size ceiling)
//!   before any network activity.
//! - Build the multipart request envelope with bearer auth and a stable
//!   idempotency key.
//! - Execute submissions through an injectable transport abstraction and
//!   hand raw payloads to the analysis contract.
//! - Model the single-submission state machine and classify failures.
//!
//! ## Data flow
//! [`validate_audio_file`] -> [`UploadClient::submit`] sends an
//! [`UploadEnvelope`] through [`UploadTransport`] -> raw body parses into a
//! [`vocal_guard_analysis_contract::RawAnalysisResponse`] for normalization.
//!
//! ## Ownership and lifetimes
//! Envelopes own their body bytes so transports can outlive the originating
//! file selection.
//!
//! ## Error model
//! Policy violations, transport failures, and contract violations surface as
//! [`UploadError`]; [`classify_upload_error`] maps them onto the user-facing
//! taxonomy. Nothing is retried automatically.
//!
//! ## Security and privacy notes
//! The bearer token travels only inside the envelope; this crate never logs
//! envelope contents.

use std::sync::Arc;

use rand::Rng as _;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;
use vocal_guard_analysis_contract::{ContractError, RawAnalysisResponse, parse_analysis_response};
use vocal_guard_core::AudioFile;

/// Standard analysis endpoint path.
pub const STANDARD_ANALYSIS_PATH: &str = "/detect-deepfake/";
/// Advanced analysis endpoint path.
pub const ADVANCED_ANALYSIS_PATH: &str = "/detect-deepfake-advanced/";

/// Upload size ceiling in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Declared MIME types accepted for analysis.
pub const ALLOWED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/flac",
    "audio/x-flac",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/vnd.wave",
];

/// Backend analysis variant selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Default detection pipeline.
    Standard,
    /// Extended detection pipeline with additional feature findings.
    Advanced,
}

impl AnalysisMode {
    /// Returns the endpoint path for this variant.
    pub fn path(&self) -> &'static str {
        match self {
            AnalysisMode::Standard => STANDARD_ANALYSIS_PATH,
            AnalysisMode::Advanced => ADVANCED_ANALYSIS_PATH,
        }
    }

    /// Returns the stable name used in idempotency keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Standard => "standard",
            AnalysisMode::Advanced => "advanced",
        }
    }
}

/// Checks a selected file against the upload policy.
///
/// Pure and synchronous; a rejected file never causes network activity.
///
/// # Errors
/// Returns [`UploadError::UnsupportedType`] when the declared MIME type is
/// not on the allow-list and [`UploadError::TooLarge`] when the file exceeds
/// [`MAX_UPLOAD_BYTES`].
pub fn validate_audio_file(file: &AudioFile) -> Result<(), UploadError> {
    let declared = file.content_type.trim().to_ascii_lowercase();
    if !ALLOWED_AUDIO_TYPES.contains(&declared.as_str()) {
        return Err(UploadError::UnsupportedType(file.content_type.clone()));
    }

    if file.size_bytes() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size_bytes: file.size_bytes(),
            limit_bytes: MAX_UPLOAD_BYTES,
        });
    }

    Ok(())
}

/// Fully assembled request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEnvelope {
    /// Absolute endpoint URL for the selected analysis variant.
    pub endpoint: String,
    /// Bearer token asserted on the request.
    pub bearer_token: String,
    /// Stable key identifying this logical submission.
    pub idempotency_key: String,
    /// `multipart/form-data` content type including the boundary.
    pub content_type: String,
    /// Encoded multipart body bytes.
    pub body: Vec<u8>,
}

/// Encodes one file as a single-part `multipart/form-data` body.
///
/// The part is named `file`, matching the backend's upload handler.
pub fn encode_multipart_file(file: &AudioFile, boundary: &str) -> Vec<u8> {
    let header = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
        file.file_name, file.content_type
    );
    let trailer = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(header.len() + file.bytes.len() + trailer.len());
    body.extend_from_slice(header.as_bytes());
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(trailer.as_bytes());
    body
}

/// Generates a fresh multipart boundary.
///
/// The random suffix keeps the boundary from colliding with file content.
pub fn random_boundary() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("vocal-guard-{suffix}")
}

/// Derives the stable idempotency key for one logical submission.
///
/// Identical file bytes, name, and mode always produce the same key, so a
/// backend can collapse accidental duplicate submissions.
pub fn idempotency_key_for_submission(file: &AudioFile, mode: AnalysisMode) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mode.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(file.file_name.as_bytes());
    hasher.update([0]);
    hasher.update(&file.bytes);
    hex::encode(hasher.finalize())
}

/// Abstract transport used by the upload client.
pub trait UploadTransport: Send + Sync {
    /// Sends one envelope and returns the raw response body.
    ///
    /// # Errors
    /// Implementations map HTTP failures onto [`UploadError`] transport
    /// variants; auth rejections must use [`UploadError::Unauthorized`] or a
    /// 401/403 [`UploadError::Server`] status so classification works.
    fn send(&self, envelope: &UploadEnvelope) -> Result<String, UploadError>;
}

/// Upload client that validates endpoint policy and executes submissions.
#[derive(Clone)]
pub struct UploadClient {
    base: Url,
    transport: Arc<dyn UploadTransport>,
}

impl UploadClient {
    /// Creates a validated upload client.
    ///
    /// # Errors
    /// Returns [`UploadError::InvalidEndpoint`] when the base URL is not
    /// `http`/`https` or has no host.
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn UploadTransport>,
    ) -> Result<Self, UploadError> {
        let base_url = base_url.into();
        let base = Url::parse(&base_url)
            .map_err(|error| UploadError::InvalidEndpoint(format!("invalid api base url: {error}")))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(UploadError::InvalidEndpoint(
                "api base must use http or https".to_string(),
            ));
        }
        if base.host_str().is_none() {
            return Err(UploadError::InvalidEndpoint(
                "api base must include a host".to_string(),
            ));
        }

        Ok(Self { base, transport })
    }

    /// Submits one validated file to the selected analysis endpoint.
    ///
    /// Exactly one network call happens per invocation; concurrency gating
    /// across invocations belongs to [`SubmissionGate`].
    ///
    /// # Errors
    /// Policy violations are re-checked here so a caller bug cannot push an
    /// invalid file onto the network. Transport errors propagate as-is;
    /// undecodable response bodies surface as [`UploadError::InvalidResponse`].
    pub fn submit(
        &self,
        file: &AudioFile,
        bearer_token: &str,
        mode: AnalysisMode,
    ) -> Result<RawAnalysisResponse, UploadError> {
        validate_audio_file(file)?;

        if bearer_token.trim().is_empty() {
            return Err(UploadError::Unauthorized(
                "submission requires an active session".to_string(),
            ));
        }

        let boundary = random_boundary();
        let envelope = UploadEnvelope {
            endpoint: self.endpoint(mode),
            bearer_token: bearer_token.to_string(),
            idempotency_key: idempotency_key_for_submission(file, mode),
            content_type: format!("multipart/form-data; boundary={boundary}"),
            body: encode_multipart_file(file, &boundary),
        };

        let raw_body = self.transport.send(&envelope)?;
        parse_analysis_response(&raw_body).map_err(|ContractError::Decode(error)| {
            UploadError::InvalidResponse(error.to_string())
        })
    }

    /// Returns the absolute endpoint URL for `mode`.
    pub fn endpoint(&self, mode: AnalysisMode) -> String {
        match self.base.join(mode.path()) {
            Ok(joined) => joined.to_string(),
            // Invariant: mode paths are static absolute paths; join only
            // fails for cannot-be-a-base URLs, which `new` already rejects.
            Err(_) => format!("{}{}", self.base.as_str().trim_end_matches('/'), mode.path()),
        }
    }
}

/// States of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// No file is being processed.
    Idle,
    /// Upload policy checks are running.
    Validating,
    /// The selected file was rejected locally; terminal for this selection.
    InvalidFile,
    /// The network call is in flight.
    Submitting,
    /// The raw response is being normalized.
    Normalizing,
    /// The normalized result was produced; terminal for this selection.
    Done,
    /// Submission or normalization failed; terminal for this selection.
    Failed,
}

impl SubmissionState {
    fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Validating => "validating",
            SubmissionState::InvalidFile => "invalid_file",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Normalizing => "normalizing",
            SubmissionState::Done => "done",
            SubmissionState::Failed => "failed",
        }
    }
}

/// Submission gate with explicit legal transitions.
///
/// The gate is what makes "exactly one submission in flight" enforceable:
/// a second `begin_validation` while a submission is active is an illegal
/// transition, and the UI additionally disables the triggering control.
#[derive(Debug, Clone)]
pub struct SubmissionGate {
    state: SubmissionState,
}

impl SubmissionGate {
    /// Creates a gate in the `Idle` state.
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
        }
    }

    /// Returns the current state snapshot.
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Returns `true` while a submission attempt is being processed.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self.state,
            SubmissionState::Validating | SubmissionState::Submitting | SubmissionState::Normalizing
        )
    }

    /// Enters validation for a new submission attempt.
    ///
    /// Legal from `Idle` and from every terminal state: a re-click after a
    /// failure is a manual retry starting a fresh submission. Only an
    /// in-flight submission refuses re-entry.
    ///
    /// # Errors
    /// Returns [`UploadError::IllegalTransition`] while a submission is in
    /// flight.
    pub fn begin_validation(&mut self) -> Result<(), UploadError> {
        if self.is_in_flight() {
            return Err(UploadError::IllegalTransition {
                from: self.state.name(),
                to: SubmissionState::Validating.name(),
            });
        }
        self.state = SubmissionState::Validating;
        Ok(())
    }

    /// Records a local policy rejection.
    ///
    /// # Errors
    /// Returns [`UploadError::IllegalTransition`] unless validating.
    pub fn mark_invalid(&mut self) -> Result<(), UploadError> {
        self.advance(SubmissionState::Validating, SubmissionState::InvalidFile)
    }

    /// Enters the in-flight network phase.
    ///
    /// # Errors
    /// Returns [`UploadError::IllegalTransition`] unless validating.
    pub fn begin_submitting(&mut self) -> Result<(), UploadError> {
        self.advance(SubmissionState::Validating, SubmissionState::Submitting)
    }

    /// Enters normalization after a successful response.
    ///
    /// # Errors
    /// Returns [`UploadError::IllegalTransition`] unless submitting.
    pub fn begin_normalizing(&mut self) -> Result<(), UploadError> {
        self.advance(SubmissionState::Submitting, SubmissionState::Normalizing)
    }

    /// Marks the submission complete.
    ///
    /// # Errors
    /// Returns [`UploadError::IllegalTransition`] unless normalizing.
    pub fn complete(&mut self) -> Result<(), UploadError> {
        self.advance(SubmissionState::Normalizing, SubmissionState::Done)
    }

    /// Marks the submission failed from either active phase.
    ///
    /// # Errors
    /// Returns [`UploadError::IllegalTransition`] unless submitting or
    /// normalizing.
    pub fn fail(&mut self) -> Result<(), UploadError> {
        match self.state {
            SubmissionState::Submitting | SubmissionState::Normalizing => {
                self.state = SubmissionState::Failed;
                Ok(())
            }
            other => Err(UploadError::IllegalTransition {
                from: other.name(),
                to: SubmissionState::Failed.name(),
            }),
        }
    }

    /// Returns to `Idle` for a new file selection, from any state.
    pub fn reset(&mut self) {
        self.state = SubmissionState::Idle;
    }

    fn advance(
        &mut self,
        expected: SubmissionState,
        next: SubmissionState,
    ) -> Result<(), UploadError> {
        if self.state != expected {
            return Err(UploadError::IllegalTransition {
                from: self.state.name(),
                to: next.name(),
            });
        }
        self.state = next;
        Ok(())
    }
}

impl Default for SubmissionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// User-facing failure taxonomy for submission errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Local policy rejection; no network call was made.
    Validation,
    /// Credential or token rejection; triggers lazy session invalidation.
    Auth,
    /// The request could not complete.
    Network,
    /// The backend answered with a non-2xx status or an unusable payload.
    Server,
}

/// Maps an upload error onto the user-facing taxonomy.
pub fn classify_upload_error(error: &UploadError) -> FailureClass {
    match error {
        UploadError::UnsupportedType(_) | UploadError::TooLarge { .. } => FailureClass::Validation,
        UploadError::Unauthorized(_) => FailureClass::Auth,
        UploadError::Server { status, .. } if *status == 401 || *status == 403 => FailureClass::Auth,
        UploadError::Timeout | UploadError::Network(_) => FailureClass::Network,
        UploadError::Server { .. }
        | UploadError::InvalidResponse(_)
        | UploadError::InvalidEndpoint(_)
        | UploadError::IllegalTransition { .. } => FailureClass::Server,
    }
}

/// Generic fallback shown when the backend supplies no detail message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Analysis failed. Please try again.";

/// Builds the message surfaced to the user for a failed submission.
///
/// Backend-supplied detail strings pass through verbatim; everything else
/// falls back to a stable generic message per failure class.
pub fn user_facing_message(error: &UploadError) -> String {
    match error {
        UploadError::UnsupportedType(_) | UploadError::TooLarge { .. } => error.to_string(),
        UploadError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
        UploadError::Unauthorized(message) if !message.trim().is_empty() => message.clone(),
        UploadError::Timeout | UploadError::Network(_) => {
            "Could not reach the analysis service. Check your connection and try again.".to_string()
        }
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

/// Errors produced by upload policy, transport, and gating logic.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Declared file type is not on the allow-list.
    #[error("unsupported file type '{0}'; select an mp3, flac, or wav file")]
    UnsupportedType(String),
    /// File exceeds the upload ceiling.
    #[error("file is {size_bytes} bytes; the limit is {limit_bytes} bytes")]
    TooLarge {
        /// Size of the rejected file.
        size_bytes: usize,
        /// Configured ceiling.
        limit_bytes: usize,
    },
    /// Endpoint violates configuration requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Bearer token was rejected or missing.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The request timed out.
    #[error("request timed out")]
    Timeout,
    /// The request could not complete.
    #[error("network failure: {0}")]
    Network(String),
    /// Non-2xx response with a structured detail message.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Backend-supplied detail, or a generic fallback.
        message: String,
    },
    /// Response body violated the analysis contract.
    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),
    /// Submission gate refused a state transition.
    #[error("illegal submission transition from '{from}' to '{to}'")]
    IllegalTransition {
        /// State the gate was in.
        from: &'static str,
        /// State the caller requested.
        to: &'static str,
    },
}
