//! Sylva Core Library
//!
//! This crate provides the shared domain models of the rendering pipeline:
//! the field schema and configuration validator, dataset shapes, the YAML
//! site configuration model, artifact types, and the unified error taxonomy
//! used across all Sylva components.

pub mod artifact;
pub mod dataset;
pub mod error;
pub mod schema;
pub mod site_config;

// Re-export commonly used types
pub use artifact::{ArtifactKind, EntryOutcome, EntryStatus, ExportRun, RenderResult};
pub use dataset::{DataShape, Dataset, DatasetMap, Feature};
pub use error::{FieldError, PipelineResult, RenderError};
pub use schema::{validate, FieldSpec, FieldType, Strictness, ValidatedConfig};
pub use site_config::{ConfigEntry, PluginKind, SiteConfig};
