#![warn(missing_docs)]
//! # vocal-guard-contract-tests
//!
//! Holds no runtime code. The crate exists to validate the frozen JSON
//! contract fixtures under `contracts/` against their schemas; see
//! `tests/contract_validation.rs`.
