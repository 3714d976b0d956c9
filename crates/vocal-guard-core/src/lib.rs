#![warn(missing_docs)]
//! # vocal-guard-core
//!
//! ## Purpose
//! Defines the pure data model used across the `vocal-guard` workspace.
//!
//! ## Responsibilities
//! - Represent the authenticated session and its persisted record form.
//! - Represent a user-selected audio file handed to the upload pipeline.
//! - Encode/decode the durable session record for local storage.
//!
//! ## Data flow
//! Auth responses produce [`Session`] values. The session layer converts them
//! to [`SessionRecord`] for durable storage and back on startup. UI file
//! selection produces [`AudioFile`] values consumed by upload validation.
//!
//! ## Ownership and lifetimes
//! Sessions and audio files own their backing strings/buffers (`String`,
//! `Vec<u8>`) to avoid hidden borrow/lifetime coupling between UI, storage,
//! and transport stages.
//!
//! ## Error model
//! Validation failures (blank credential fields, empty file names) return
//! [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate treats the bearer token as an opaque value and never transforms
//! or logs it.
//!
//! ## Example
//! ```rust
//! use vocal_guard_core::Session;
//!
//! let session = Session::new("token-abc", "uid-1", None, Some("ana@example.test")).unwrap();
//! assert_eq!(session.username, "ana");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authenticated identity held by the client.
///
/// # Invariant
/// A session either does not exist at all or has non-empty `token` and
/// `user_id`. The constructor enforces this; there is no way to build a
/// partially populated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer credential for protected API calls.
    pub token: String,
    /// Server-assigned user identifier.
    pub user_id: String,
    /// Display name; defaulted when the server omits it.
    pub username: String,
    /// Account email, when known.
    pub email: Option<String>,
}

impl Session {
    /// Constructs a validated session, applying the username defaulting rule.
    ///
    /// # Semantics
    /// A missing or blank username falls back to the local part of `email`;
    /// when no usable email exists either, it falls back to `user-{user_id}`.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingSessionField`] when `token` or `user_id`
    /// is blank.
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        username: Option<String>,
        email: Option<&str>,
    ) -> Result<Self, CoreError> {
        let token = token.into();
        let user_id = user_id.into();

        if token.trim().is_empty() {
            return Err(CoreError::MissingSessionField { field: "token" });
        }
        if user_id.trim().is_empty() {
            return Err(CoreError::MissingSessionField { field: "user_id" });
        }

        let email = email
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let username = username
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| email.as_deref().and_then(email_local_part))
            .unwrap_or_else(|| format!("user-{user_id}"));

        Ok(Self {
            token,
            user_id,
            username,
            email,
        })
    }

    /// Rebuilds a session from its persisted record.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingSessionField`] when the record lacks a
    /// token or user id, so callers can treat the stored state as absent.
    pub fn from_record(record: &SessionRecord) -> Result<Self, CoreError> {
        let email = if record.email.trim().is_empty() {
            None
        } else {
            Some(record.email.as_str())
        };

        Self::new(
            record.token.clone(),
            record.user_id.clone(),
            Some(record.username.clone()),
            email,
        )
    }

    /// Converts this session into its flat persisted form.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            token: self.token.clone(),
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            email: self.email.clone().unwrap_or_default(),
        }
    }
}

/// Flat string-field form of [`Session`] persisted to durable local storage.
///
/// The serialized key names are fixed; storage readers from earlier client
/// generations expect exactly `token`, `userId`, `username`, and `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Bearer token value.
    pub token: String,
    /// User identifier under the historical `userId` key.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Display name; may be blank in records written by older clients.
    #[serde(default)]
    pub username: String,
    /// Account email; empty string when unknown.
    #[serde(default)]
    pub email: String,
}

impl SessionRecord {
    /// Serializes the record to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Deserializes a record from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Codec)
    }
}

/// User-selected audio file staged for analysis submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    /// Original file name as presented by the user's file picker.
    pub file_name: String,
    /// Declared MIME type of the file.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl AudioFile {
    /// Constructs a validated audio file handle.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingAudioField`] when the name or declared
    /// type is blank. Size and type policy checks belong to the upload layer.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, CoreError> {
        let file_name = file_name.into();
        let content_type = content_type.into();

        if file_name.trim().is_empty() {
            return Err(CoreError::MissingAudioField { field: "file_name" });
        }
        if content_type.trim().is_empty() {
            return Err(CoreError::MissingAudioField {
                field: "content_type",
            });
        }

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Returns the file size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Extracts the local part of an email address.
///
/// Returns `None` for strings without a non-empty local part.
pub fn email_local_part(email: &str) -> Option<String> {
    let local = email.split('@').next()?.trim();
    if local.is_empty() {
        return None;
    }
    Some(local.to_string())
}

/// Error type for core model validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required session field was blank.
    #[error("session field '{field}' must be non-empty")]
    MissingSessionField {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A required audio file field was blank.
    #[error("audio file field '{field}' must be non-empty")]
    MissingAudioField {
        /// Name of the offending field.
        field: &'static str,
    },
    /// JSON encoding/decoding error.
    #[error("session record codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
