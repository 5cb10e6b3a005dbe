//! Sylva rendering engine
//!
//! Resolves data bindings against the upstream dataset mapping and drives
//! export passes over the configured entry sequence: bounded parallel
//! execution, per-entry failure isolation, order-preserving reporting,
//! cooperative cancellation.

pub mod binding;
pub mod orchestrator;

pub use binding::{resolve, DataSourceBinding, ResolvedBinding};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
