//! Artifact persistence
//!
//! Takes ownership of an export run's artifacts and writes each under the
//! output root, creating intermediate directories as needed. Target paths
//! are validated against traversal out of the root. Re-running an export
//! with unchanged inputs overwrites prior artifacts at the same paths
//! byte-for-byte; deterministic rendering is the plugin's obligation, the
//! writer only guarantees plain overwrites.

use std::path::{Component, Path, PathBuf};

use tokio::fs;

use sylva_core::artifact::{EntryStatus, ExportRun, RenderResult};
use sylva_core::error::RenderError;

/// One artifact that could not be persisted.
#[derive(Debug)]
pub struct WriteFailure {
    /// Label of the entry that produced the artifact.
    pub label: String,
    pub path: PathBuf,
    pub error: RenderError,
}

/// Result of flushing one export run.
#[derive(Debug, Default)]
pub struct WriteSummary {
    /// Absolute paths of the artifacts written, in run order.
    pub written: Vec<PathBuf>,
    pub failed: Vec<WriteFailure>,
}

impl WriteSummary {
    pub fn written_count(&self) -> usize {
        self.written.len()
    }
}

/// Writes render results under an output root directory.
pub struct OutputWriter {
    out_root: PathBuf,
}

impl OutputWriter {
    pub fn new(out_root: impl Into<PathBuf>) -> Self {
        Self {
            out_root: out_root.into(),
        }
    }

    /// Persist every artifact of the run.
    ///
    /// The run is consumed: artifact ownership transfers to the writer at
    /// this point and results are not handed back.
    pub async fn flush(&self, run: ExportRun) -> WriteSummary {
        let mut summary = WriteSummary::default();

        for outcome in run.outcomes {
            let EntryStatus::Rendered(results) = outcome.status else {
                continue;
            };
            for result in results {
                match self.write_artifact(&result).await {
                    Ok(path) => {
                        tracing::debug!(path = %path.display(), "artifact written");
                        summary.written.push(path);
                    }
                    Err(error) => {
                        tracing::warn!(
                            label = %outcome.label,
                            path = %result.target_path.display(),
                            error = %error,
                            "failed to write artifact"
                        );
                        summary.failed.push(WriteFailure {
                            label: outcome.label.clone(),
                            path: result.target_path.clone(),
                            error,
                        });
                    }
                }
            }
        }

        tracing::info!(
            written = summary.written.len(),
            failed = summary.failed.len(),
            out_root = %self.out_root.display(),
            "flush complete"
        );
        summary
    }

    async fn write_artifact(&self, result: &RenderResult) -> Result<PathBuf, RenderError> {
        let relative = sanitize_target(&result.target_path)?;
        let path = self.out_root.join(relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| RenderError::Write {
                    path: path.clone(),
                    source,
                })?;
        }

        fs::write(&path, &result.payload)
            .await
            .map_err(|source| RenderError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Reject target paths that would escape the output root.
fn sanitize_target(target: &Path) -> Result<&Path, RenderError> {
    let escapes = target.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(RenderError::Write {
            path: target.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "target path escapes the output root",
            ),
        });
    }
    Ok(target)
}
