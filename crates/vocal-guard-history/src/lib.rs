#![warn(missing_docs)]
//! # vocal-guard-history
//!
//! ## Purpose
//! Owns the analysis-history surface for `vocal-guard`: fetching stored
//! analyses, list-level view state, and bulk-delete reconciliation.
//!
//! ## Responsibilities
//! - Execute history list/fetch/delete requests through an injectable
//!   transport abstraction.
//! - Hold the history view state: timestamp sorting, filename filtering, and
//!   multi-select.
//! - Remove entries from local state only after server confirmation.
//!
//! ## Data flow
//! [`HistoryClient::list`] -> [`HistoryView::set_entries`] -> user filters,
//! sorts, and selects -> [`HistoryClient::delete`] -> on success
//! [`HistoryView::apply_delete`] reconciles local state.
//!
//! ## Ownership and lifetimes
//! The view owns its entries and selection; clients return owned parsed
//! values so nothing borrows from transport buffers.
//!
//! ## Error model
//! Transport and contract failures surface as [`HistoryError`]; a failed
//! delete leaves local state untouched.
//!
//! ## Security and privacy notes
//! The bearer token is passed through to the transport and never logged.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use url::Url;
use vocal_guard_analysis_contract::{
    AnalysisResult, ContractError, HistoryEntry, normalize, parse_analysis_response,
    parse_history_response,
};

/// History list path.
pub const LIST_ANALYSES_PATH: &str = "/user/analyses";
/// Bulk delete path.
pub const DELETE_ANALYSES_PATH: &str = "/analyses/delete";

/// Returns the retrieval path for one stored analysis.
pub fn analysis_path(analysis_id: &str) -> String {
    format!("/analyses/{analysis_id}")
}

/// Bulk delete request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRequest {
    /// Backend identifiers of the analyses to remove.
    pub analysis_ids: Vec<String>,
}

/// Abstract transport used by the history client.
pub trait HistoryTransport: Send + Sync {
    /// Fetches the history list payload.
    fn fetch_list(&self, endpoint: &str, bearer_token: &str) -> Result<String, HistoryError>;

    /// Fetches one stored analysis payload.
    fn fetch_analysis(&self, endpoint: &str, bearer_token: &str) -> Result<String, HistoryError>;

    /// Submits a bulk delete request.
    fn delete_analyses(
        &self,
        endpoint: &str,
        bearer_token: &str,
        request: &DeleteRequest,
    ) -> Result<(), HistoryError>;
}

/// History client that validates endpoint policy and executes list flows.
#[derive(Clone)]
pub struct HistoryClient {
    base: Url,
    transport: Arc<dyn HistoryTransport>,
}

impl HistoryClient {
    /// Creates a validated history client.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidEndpoint`] when the base URL is not
    /// `http`/`https` or has no host.
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HistoryTransport>,
    ) -> Result<Self, HistoryError> {
        let base_url = base_url.into();
        let base = Url::parse(&base_url).map_err(|error| {
            HistoryError::InvalidEndpoint(format!("invalid api base url: {error}"))
        })?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(HistoryError::InvalidEndpoint(
                "api base must use http or https".to_string(),
            ));
        }
        if base.host_str().is_none() {
            return Err(HistoryError::InvalidEndpoint(
                "api base must include a host".to_string(),
            ));
        }

        Ok(Self { base, transport })
    }

    /// Fetches and parses the caller's stored analyses.
    ///
    /// # Errors
    /// Propagates transport errors; undecodable payloads surface as
    /// [`HistoryError::InvalidResponse`].
    pub fn list(&self, bearer_token: &str) -> Result<Vec<HistoryEntry>, HistoryError> {
        let raw = self
            .transport
            .fetch_list(&self.endpoint(LIST_ANALYSES_PATH), bearer_token)?;
        parse_history_response(&raw).map_err(into_invalid_response)
    }

    /// Fetches one stored analysis and normalizes it for the detail view.
    ///
    /// # Errors
    /// Same contract as [`HistoryClient::list`].
    pub fn fetch(&self, bearer_token: &str, analysis_id: &str) -> Result<AnalysisResult, HistoryError> {
        let raw = self
            .transport
            .fetch_analysis(&self.endpoint(&analysis_path(analysis_id)), bearer_token)?;
        let parsed = parse_analysis_response(&raw).map_err(into_invalid_response)?;
        Ok(normalize(&parsed))
    }

    /// Deletes the given analyses on the backend.
    ///
    /// An empty id list is a local no-op: there is nothing to confirm, so no
    /// request is made.
    ///
    /// # Errors
    /// Propagates the transport error; callers must leave local state
    /// untouched on failure.
    pub fn delete(&self, bearer_token: &str, analysis_ids: &[String]) -> Result<(), HistoryError> {
        if analysis_ids.is_empty() {
            return Ok(());
        }

        self.transport.delete_analyses(
            &self.endpoint(DELETE_ANALYSES_PATH),
            bearer_token,
            &DeleteRequest {
                analysis_ids: analysis_ids.to_vec(),
            },
        )
    }

    /// Joins an operation path onto the validated base URL.
    pub fn endpoint(&self, path: &str) -> String {
        match self.base.join(path) {
            Ok(joined) => joined.to_string(),
            // Invariant: operation paths are static absolute paths; join only
            // fails for cannot-be-a-base URLs, which `new` already rejects.
            Err(_) => format!("{}{path}", self.base.as_str().trim_end_matches('/')),
        }
    }
}

fn into_invalid_response(error: ContractError) -> HistoryError {
    let ContractError::Decode(error) = error;
    HistoryError::InvalidResponse(error.to_string())
}

/// Timestamp ordering applied to the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recent analyses first (default).
    NewestFirst,
    /// Oldest analyses first.
    OldestFirst,
}

/// List-level history state owned by the history view.
#[derive(Debug, Clone)]
pub struct HistoryView {
    entries: Vec<HistoryEntry>,
    filter: String,
    sort: SortOrder,
    selection: BTreeSet<String>,
}

impl HistoryView {
    /// Creates an empty view sorted newest-first.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            filter: String::new(),
            sort: SortOrder::NewestFirst,
            selection: BTreeSet::new(),
        }
    }

    /// Replaces the entry list after a fetch.
    ///
    /// Selected ids that no longer exist are pruned so the selection can
    /// never reference unknown entries.
    pub fn set_entries(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries;
        let known: BTreeSet<&str> = self
            .entries
            .iter()
            .map(|entry| entry.analysis_id.as_str())
            .collect();
        self.selection.retain(|id| known.contains(id.as_str()));
    }

    /// Returns all known entries in fetch order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Sets the filename substring filter.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Sets the timestamp sort order.
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    /// Returns the filtered, sorted entries for rendering.
    ///
    /// Filtering is a case-insensitive substring match on the file name.
    pub fn visible(&self) -> Vec<HistoryEntry> {
        let needle = self.filter.trim().to_lowercase();
        let mut visible: Vec<HistoryEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                needle.is_empty() || entry.filename.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        match self.sort {
            SortOrder::NewestFirst => {
                visible.sort_by(|a, b| b.recorded_at_ms.cmp(&a.recorded_at_ms));
            }
            SortOrder::OldestFirst => {
                visible.sort_by(|a, b| a.recorded_at_ms.cmp(&b.recorded_at_ms));
            }
        }
        visible
    }

    /// Toggles selection of one entry; unknown ids are ignored.
    ///
    /// Returns `true` when the entry is selected after the call.
    pub fn toggle_selection(&mut self, analysis_id: &str) -> bool {
        let known = self
            .entries
            .iter()
            .any(|entry| entry.analysis_id == analysis_id);
        if !known {
            return false;
        }

        if self.selection.remove(analysis_id) {
            false
        } else {
            self.selection.insert(analysis_id.to_string());
            true
        }
    }

    /// Returns the selected ids in stable order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.iter().cloned().collect()
    }

    /// Returns the number of selected entries.
    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Clears the selection without touching entries.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Reconciles local state after the backend confirmed a delete.
    ///
    /// Exactly the confirmed ids are removed and the selection is cleared.
    /// Callers must not invoke this on a failed delete.
    pub fn apply_delete(&mut self, confirmed_ids: &[String]) {
        let confirmed: BTreeSet<&str> = confirmed_ids.iter().map(String::as_str).collect();
        self.entries
            .retain(|entry| !confirmed.contains(entry.analysis_id.as_str()));
        self.selection.clear();
    }
}

impl Default for HistoryView {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors produced by history transport and parsing logic.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Endpoint violates configuration requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Bearer token was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
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
    /// Response body violated the history contract.
    #[error("invalid history response: {0}")]
    InvalidResponse(String),
}

impl HistoryError {
    /// Returns `true` when this error marks a rejected token, which should
    /// trigger lazy session invalidation.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            HistoryError::Unauthorized(_) => true,
            HistoryError::Server { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}
