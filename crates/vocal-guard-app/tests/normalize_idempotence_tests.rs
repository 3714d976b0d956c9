//! Integration tests for normalization idempotence.

use vocal_guard_analysis_contract::{normalize, parse_analysis_response};

#[test]
fn normalize_idempotence_tests_same_raw_payload_yields_identical_records() {
    let raw = parse_analysis_response(
        r#"{
            "isAI": true,
            "confidence": 0.87,
            "filename": "clip.wav",
            "probabilities": {"fake": 0.87, "real": 0.13}
        }"#,
    )
    .expect("payload should parse");

    assert_eq!(normalize(&raw), normalize(&raw));
}

#[test]
fn normalize_idempotence_tests_renormalizing_a_normalized_record_changes_nothing() {
    let raw = parse_analysis_response(
        r#"{
            "is_fake": true,
            "confidence": 0.87,
            "filename": "clip.wav",
            "format": "wav",
            "details": [
                {"label": "Spectral Flatness", "value": "0.42", "description": "Mid-band flatness score."}
            ],
            "analysis_id": "a-1",
            "model_used": "advanced"
        }"#,
    )
    .expect("payload should parse");

    let first = normalize(&raw);
    let second = normalize(&first.to_raw());
    assert_eq!(second, first);
}
