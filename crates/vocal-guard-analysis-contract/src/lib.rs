#![warn(missing_docs)]
//! # vocal-guard-analysis-contract
//!
//! ## Purpose
//! Defines the backend analysis response schema and the normalization
//! boundary that converts it into the application's single canonical result
//! shape.
//!
//! ## Responsibilities
//! - Parse the heterogeneous response payloads emitted by different backend
//!   model variants.
//! - Reconcile historical field spellings and confidence scales into one
//!   display-ready record.
//! - Parse history-list payloads and reconstruct detail records from them.
//!
//! ## Data flow
//! Raw JSON response -> [`parse_analysis_response`] -> [`normalize`] ->
//! [`AnalysisResult`] consumed by UI projection and history state.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers.
//!
//! ## Error model
//! Invalid JSON returns [`ContractError::Decode`]. Normalization itself never
//! fails: missing optional fields degrade to explicit placeholders so
//! heterogeneous shapes cannot leak past this boundary.
//!
//! ## Security and privacy notes
//! This crate processes only model outputs and audio metadata; it does not
//! touch authentication secrets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder for metadata the backend did not supply.
pub const UNKNOWN_FIELD: &str = "Unknown";

/// Label of the detail entry synthesized when the backend supplies none.
pub const OVERALL_DETAIL_LABEL: &str = "Overall Analysis";

/// Model name assumed when the backend omits `model_used`.
pub const DEFAULT_MODEL: &str = "standard";

/// Raw analysis response as returned by the detection endpoints.
///
/// Every field is optional; different backend model variants populate
/// different subsets, and the classification boolean appears under either of
/// two historical spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysisResponse {
    /// Server-of-record classification spelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fake: Option<bool>,
    /// Legacy client classification spelling.
    #[serde(default, rename = "isAI", skip_serializing_if = "Option::is_none")]
    pub is_ai: Option<bool>,
    /// Confidence as either a 0-1 fraction or a 0-100 percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Name of the analyzed file.
    #[serde(default, alias = "file_name", skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Audio duration, as formatted by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Audio container/codec format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Sample rate, as formatted by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<String>,
    /// Named sub-feature findings, when the model variant reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<RawAnalysisDetail>>,
    /// Per-class probability map reported by some model variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
    /// Backend identifier of the stored audio metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_id: Option<String>,
    /// Backend identifier of the stored analysis record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    /// Backend identifier of the stored detail record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_id: Option<String>,
    /// Model variant that produced the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// One raw sub-feature finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnalysisDetail {
    /// Finding name.
    #[serde(default)]
    pub label: String,
    /// Finding value, already formatted by the backend.
    #[serde(default)]
    pub value: String,
    /// Human-readable explanation.
    #[serde(default)]
    pub description: String,
}

/// Canonical, display-ready analysis record.
///
/// # Invariant
/// `confidence` is always on the 0-100 scale, `is_ai` is the single
/// reconciled classification field, and `details` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Analyzed file name, or a placeholder.
    pub filename: String,
    /// Audio duration, or a placeholder.
    pub duration: String,
    /// Audio format, or a placeholder.
    pub format: String,
    /// Sample rate, or a placeholder.
    pub sample_rate: String,
    /// Canonical classification: `true` marks synthetic audio.
    pub is_ai: bool,
    /// Confidence percentage, rounded, clamped to 0-100.
    pub confidence: u32,
    /// Sub-feature findings; at least one entry after normalization.
    pub details: Vec<AnalysisDetail>,
    /// Backend identifier of the stored audio metadata.
    pub metadata_id: Option<String>,
    /// Backend identifier of the stored analysis record.
    pub analysis_id: Option<String>,
    /// Backend identifier of the stored detail record.
    pub details_id: Option<String>,
    /// Model variant that produced the result.
    pub model: String,
}

/// One canonical sub-feature finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDetail {
    /// Finding name.
    pub label: String,
    /// Finding value.
    pub value: String,
    /// Human-readable explanation.
    pub description: String,
}

impl AnalysisResult {
    /// Reconstructs a detail-view record from a lightweight history entry.
    ///
    /// Audio metadata the list projection does not carry degrades to
    /// placeholders, and one overall detail entry is synthesized.
    pub fn from_history_entry(entry: &HistoryEntry) -> Self {
        Self {
            filename: entry.filename.clone(),
            duration: UNKNOWN_FIELD.to_string(),
            format: UNKNOWN_FIELD.to_string(),
            sample_rate: UNKNOWN_FIELD.to_string(),
            is_ai: entry.is_ai,
            confidence: entry.confidence,
            details: vec![overall_detail(entry.is_ai, entry.confidence)],
            metadata_id: None,
            analysis_id: Some(entry.analysis_id.clone()),
            details_id: None,
            model: entry.model.clone(),
        }
    }

    /// Re-expresses this record in the raw wire shape.
    ///
    /// Useful for feeding an already-normalized record back through
    /// [`normalize`], which must change nothing.
    pub fn to_raw(&self) -> RawAnalysisResponse {
        RawAnalysisResponse {
            is_fake: Some(self.is_ai),
            is_ai: None,
            confidence: Some(f64::from(self.confidence)),
            filename: placeholder_to_none(&self.filename),
            duration: placeholder_to_none(&self.duration),
            format: placeholder_to_none(&self.format),
            sample_rate: placeholder_to_none(&self.sample_rate),
            details: Some(
                self.details
                    .iter()
                    .map(|detail| RawAnalysisDetail {
                        label: detail.label.clone(),
                        value: detail.value.clone(),
                        description: detail.description.clone(),
                    })
                    .collect(),
            ),
            probabilities: None,
            metadata_id: self.metadata_id.clone(),
            analysis_id: self.analysis_id.clone(),
            details_id: self.details_id.clone(),
            model_used: Some(self.model.clone()),
        }
    }
}

/// List-level projection of one stored analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Backend identifier used for retrieval and deletion.
    pub analysis_id: String,
    /// Analyzed file name, or a placeholder.
    pub filename: String,
    /// Canonical classification.
    pub is_ai: bool,
    /// Confidence percentage on the 0-100 scale.
    pub confidence: u32,
    /// Server timestamp in epoch milliseconds.
    pub recorded_at_ms: u64,
    /// Model variant that produced the result.
    pub model: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawHistoryEntry {
    #[serde(default, alias = "id")]
    analysis_id: Option<String>,
    #[serde(default, alias = "file_name")]
    filename: Option<String>,
    #[serde(default)]
    is_fake: Option<bool>,
    #[serde(default, rename = "isAI")]
    is_ai: Option<bool>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "created_at")]
    timestamp: Option<u64>,
    #[serde(default)]
    model_used: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHistoryResponse {
    #[serde(default)]
    analyses: Vec<RawHistoryEntry>,
}

/// Parses raw JSON from a detection endpoint.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON. Shape variance within
/// valid JSON is absorbed later by [`normalize`].
pub fn parse_analysis_response(raw: &str) -> Result<RawAnalysisResponse, ContractError> {
    serde_json::from_str(raw).map_err(ContractError::Decode)
}

/// Parses the history-list payload (`{"analyses": [...]}`).
///
/// Entries without a backend identifier are dropped: the client cannot
/// retrieve or delete them, so surfacing them would produce dead rows.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON.
pub fn parse_history_response(raw: &str) -> Result<Vec<HistoryEntry>, ContractError> {
    let parsed: RawHistoryResponse = serde_json::from_str(raw).map_err(ContractError::Decode)?;

    Ok(parsed
        .analyses
        .into_iter()
        .filter_map(|entry| {
            let analysis_id = entry
                .analysis_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())?
                .to_string();

            Some(HistoryEntry {
                analysis_id,
                filename: entry
                    .filename
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
                is_ai: entry.is_fake.or(entry.is_ai).unwrap_or(false),
                confidence: entry.confidence.map(normalize_confidence).unwrap_or(0),
                recorded_at_ms: entry.timestamp.unwrap_or(0),
                model: entry
                    .model_used
                    .filter(|model| !model.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            })
        })
        .collect())
}

/// Produces the canonical record from a raw detection response.
///
/// # Semantics
/// - Confidence magnitude disambiguation: values at or below 1 are fractions
///   and scale by 100; values above 1 are percentages. Out-of-range values
///   clamp into 0-100.
/// - The classification boolean is reconciled with `is_fake` winning over the
///   legacy `isAI` spelling; both absent reads as human.
/// - An absent or empty detail list is replaced by one synthesized overall
///   entry; a probability map adds one synthesized entry per class.
/// - Missing metadata degrades to [`UNKNOWN_FIELD`].
///
/// Never fails, and is idempotent: normalizing the raw view of an already
/// normalized record changes nothing.
pub fn normalize(raw: &RawAnalysisResponse) -> AnalysisResult {
    let is_ai = raw.is_fake.or(raw.is_ai).unwrap_or(false);
    let confidence = raw.confidence.map(normalize_confidence).unwrap_or(0);

    let mut details: Vec<AnalysisDetail> = raw
        .details
        .iter()
        .flatten()
        .filter(|detail| !detail.label.trim().is_empty())
        .map(|detail| AnalysisDetail {
            label: detail.label.clone(),
            value: detail.value.clone(),
            description: detail.description.clone(),
        })
        .collect();

    if details.is_empty() {
        details.push(overall_detail(is_ai, confidence));
    }

    if let Some(probabilities) = &raw.probabilities {
        for (class, value) in probabilities {
            details.push(probability_detail(class, *value));
        }
    }

    AnalysisResult {
        filename: field_or_unknown(&raw.filename),
        duration: field_or_unknown(&raw.duration),
        format: field_or_unknown(&raw.format),
        sample_rate: field_or_unknown(&raw.sample_rate),
        is_ai,
        confidence,
        details,
        metadata_id: raw.metadata_id.clone(),
        analysis_id: raw.analysis_id.clone(),
        details_id: raw.details_id.clone(),
        model: raw
            .model_used
            .clone()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
    }
}

/// Scales a backend confidence value onto the 0-100 percentage scale.
///
/// Magnitude decides the interpretation: `c <= 1` is a fraction (so exactly
/// 1 means 100%), anything above is already a percentage. Values outside the
/// scale clamp to its edges.
pub fn normalize_confidence(confidence: f64) -> u32 {
    if !confidence.is_finite() || confidence <= 0.0 {
        return 0;
    }

    let percentage = if confidence <= 1.0 {
        confidence * 100.0
    } else {
        confidence
    };

    percentage.round().min(100.0) as u32
}

fn overall_detail(is_ai: bool, confidence: u32) -> AnalysisDetail {
    let (value, description) = if is_ai {
        (
            "AI Generated",
            "The model classified this audio as synthetic speech.",
        )
    } else {
        (
            "Human Voice",
            "The model classified this audio as natural human speech.",
        )
    };

    AnalysisDetail {
        label: OVERALL_DETAIL_LABEL.to_string(),
        value: format!("{value} ({confidence}%)"),
        description: description.to_string(),
    }
}

fn probability_detail(class: &str, value: f64) -> AnalysisDetail {
    let description = if denotes_synthetic_class(class) {
        "Model probability assigned to the synthetic class."
    } else {
        "Model probability assigned to the human class."
    };

    AnalysisDetail {
        label: class.to_string(),
        value: format!("{}%", normalize_confidence(value)),
        description: description.to_string(),
    }
}

fn denotes_synthetic_class(class: &str) -> bool {
    let class = class.to_ascii_lowercase();
    class == "ai"
        || class.contains("fake")
        || class.contains("synthetic")
        || class.contains("spoof")
        || class.contains("generated")
        || class.starts_with("ai_")
        || class.ends_with("_ai")
}

fn field_or_unknown(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
}

fn placeholder_to_none(field: &str) -> Option<String> {
    if field == UNKNOWN_FIELD {
        None
    } else {
        Some(field.to_string())
    }
}

/// Analysis contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("analysis decode failure: {0}")]
    Decode(#[from] serde_json::Error),
}
