//! Render artifacts and export run records
//!
//! A plugin invocation produces one or more [`RenderResult`]s; the
//! orchestrator aggregates per-entry outcomes into an [`ExportRun`], whose
//! results are handed to the output writer for persistence. Results are
//! immutable once produced; ownership transfers to the writer.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RenderError;
use crate::site_config::PluginKind;

/// The kind of artifact a plugin produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// HTML fragment, embedded into page templates.
    HtmlFragment,
    /// Standalone JSON file.
    Json,
    /// CSV file.
    Csv,
    /// Opaque sidecar file (e.g. a GeoJSON layer for a map widget).
    File,
}

/// One rendered or exported artifact.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub artifact: ArtifactKind,
    pub payload: Bytes,
    /// Path relative to the export output root.
    pub target_path: PathBuf,
}

impl RenderResult {
    pub fn new(
        artifact: ArtifactKind,
        payload: impl Into<Bytes>,
        target_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            artifact,
            payload: payload.into(),
            target_path: target_path.into(),
        }
    }
}

/// Terminal state of one configured entry.
#[derive(Debug)]
pub enum EntryStatus {
    Rendered(Vec<RenderResult>),
    Failed(RenderError),
    Cancelled,
}

/// Outcome slot for one configured entry, in declared order.
#[derive(Debug)]
pub struct EntryOutcome {
    pub label: String,
    pub plugin: String,
    pub kind: PluginKind,
    pub status: EntryStatus,
}

impl EntryOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self.status, EntryStatus::Rendered(_))
    }

    pub fn error(&self) -> Option<&RenderError> {
        match &self.status {
            EntryStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Aggregated record of one export pass.
///
/// Exactly one outcome per configured entry, in the configuration's declared
/// order; partial success is the normal expected outcome for large
/// configurations, not a failure state of the run itself.
#[derive(Debug)]
pub struct ExportRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<EntryOutcome>,
}

impl ExportRun {
    pub fn rendered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rendered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, EntryStatus::Failed(_)))
            .count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, EntryStatus::Cancelled))
            .count()
    }

    /// All artifacts of the run, paired with the label of the entry that
    /// produced them.
    pub fn artifacts(&self) -> impl Iterator<Item = (&str, &RenderResult)> {
        self.outcomes.iter().flat_map(|outcome| {
            let results: &[RenderResult] = match &outcome.status {
                EntryStatus::Rendered(results) => results,
                _ => &[],
            };
            results
                .iter()
                .map(move |result| (outcome.label.as_str(), result))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(label: &str, status: EntryStatus) -> EntryOutcome {
        EntryOutcome {
            label: label.to_string(),
            plugin: "bar_plot".to_string(),
            kind: PluginKind::Widget,
            status,
        }
    }

    #[test]
    fn run_counters_partition_outcomes() {
        let run = ExportRun {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![
                outcome(
                    "widgets[0]:bar_plot",
                    EntryStatus::Rendered(vec![RenderResult::new(
                        ArtifactKind::HtmlFragment,
                        "<div></div>",
                        "widgets/bar_plot.html",
                    )]),
                ),
                outcome(
                    "widgets[1]:bar_plot",
                    EntryStatus::Failed(RenderError::Cancelled),
                ),
                outcome("widgets[2]:bar_plot", EntryStatus::Cancelled),
            ],
        };

        assert_eq!(run.rendered_count(), 1);
        assert_eq!(run.failed_count(), 1);
        assert_eq!(run.cancelled_count(), 1);
        assert_eq!(run.artifacts().count(), 1);
    }
}
