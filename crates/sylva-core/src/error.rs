//! Error types module
//!
//! All pipeline errors are unified under the `RenderError` enum: configuration
//! and schema errors, plugin lookup errors, data binding errors, plugin
//! execution errors, and artifact write errors. Every variant is captured
//! per entry by the orchestrator; none of them aborts an export run on its
//! own. Collaborator-level failures (unreadable configuration file, missing
//! dataset file) are reported through `anyhow` at the binary seam instead.

use std::fmt;
use std::path::PathBuf;

use crate::dataset::DataShape;
use crate::site_config::PluginKind;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, RenderError>;

/// A single field-level configuration error.
///
/// Validation collects every field error for an entry before reporting, so
/// a user can fix a configuration file in one edit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted/indexed path of the offending field, e.g. `fields[2].label`
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid configuration: {}", join_field_errors(.0))]
    Configuration(Vec<FieldError>),

    #[error("{kind} plugin '{name}' is already registered")]
    DuplicateRegistration { kind: PluginKind, name: String },

    #[error("unknown {kind} plugin '{name}'")]
    UnknownPlugin { kind: PluginKind, name: String },

    #[error("data source '{source_name}' is not available")]
    MissingDataSource { source_name: String },

    #[error("data source '{source_name}' is missing field(s): {}", .fields.join(", "))]
    MissingField { source_name: String, fields: Vec<String> },

    #[error("data source '{source_name}' has shape {actual}, plugin expects {expected}")]
    IncompatibleDataShape {
        source_name: String,
        expected: DataShape,
        actual: DataShape,
    },

    #[error("plugin '{plugin}' failed: {message}")]
    PluginExecution { plugin: String, message: String },

    #[error("template '{template}' failed to render: {message}")]
    Template { template: String, message: String },

    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entry was cancelled before it started")]
    Cancelled,
}

impl RenderError {
    /// Short machine-readable error kind, used in run reports and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RenderError::Configuration(_) => "configuration",
            RenderError::DuplicateRegistration { .. } => "duplicate_registration",
            RenderError::UnknownPlugin { .. } => "unknown_plugin",
            RenderError::MissingDataSource { .. } => "missing_data_source",
            RenderError::MissingField { .. } => "missing_field",
            RenderError::IncompatibleDataShape { .. } => "incompatible_data_shape",
            RenderError::PluginExecution { .. } => "plugin_execution",
            RenderError::Template { .. } => "template",
            RenderError::Write { .. } => "write",
            RenderError::Cancelled => "cancelled",
        }
    }

    /// Convenience constructor for plugin-internal failures.
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::PluginExecution {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}
