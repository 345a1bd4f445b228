//! rdbench workspace-level test utilities.
//!
//! This crate exists solely to support workspace-level integration tests,
//! particularly the BDD/cucumber tests in `tests/cucumber.rs` and the
//! end-to-end pipeline suite in `tests/integration/`.
//!
//! The actual rdbench functionality is in the workspace member crates:
//! - `rdbench-types`: Shared data model, naming conventions and config schema
//! - `rdbench-domain`: Pure aggregation logic (normalize, combine, selectors)
//! - `rdbench-workbook`: In-memory workbook model
//! - `rdbench-render`: Sheet layout and summary synthesis
//! - `rdbench-ingest`: Result document loading
//! - `rdbench-app`: Application use cases
//! - `rdbench-cli`: CLI interface
