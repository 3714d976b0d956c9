#![warn(missing_docs)]
//! # vocal-guard-benchmarks
//!
//! Holds no runtime code. The crate exists to bound the latency of the
//! normalize/upload-prep hot path; see `tests/nfr_smoke.rs`.
