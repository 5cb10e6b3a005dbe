//! Sylva output writer
//!
//! Persists the artifacts of an export run under the configured output
//! root. Writes are independent per artifact; one failure is recorded and
//! never blocks the remaining artifacts.

pub mod writer;

pub use writer::{OutputWriter, WriteFailure, WriteSummary};
