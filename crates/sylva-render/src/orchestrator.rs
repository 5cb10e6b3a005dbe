//! Render/export orchestrator
//!
//! Drives one full export pass over the ordered entry sequence. Entries are
//! dispatched in declared order onto a bounded worker pool and execute in
//! parallel; outcomes are reassembled into declared order regardless of
//! completion order. Every per-entry error is captured into that entry's
//! slot — one broken widget configuration never aborts the remaining
//! export. Cancellation stops dispatching new entries, lets in-flight
//! entries finish, and marks never-started entries `Cancelled`.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use sylva_core::artifact::{EntryOutcome, EntryStatus, ExportRun, RenderResult};
use sylva_core::dataset::DatasetMap;
use sylva_core::error::RenderError;
use sylva_core::schema::{validate, Strictness};
use sylva_core::site_config::ConfigEntry;
use sylva_plugins::{PluginRegistry, RenderContext, ThemeEngine};

use crate::binding::{resolve, DataSourceBinding};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on concurrently executing entries.
    pub max_workers: usize,
    /// Unknown-key policy applied to every entry's params.
    pub strictness: Strictness,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            strictness: Strictness::Strict,
        }
    }
}

/// Drives export passes against a registry and theme.
///
/// The registry and theme are read-only during a run and may be shared
/// across concurrent runs; each entry exclusively owns its bound input and
/// validated config.
pub struct Orchestrator {
    registry: PluginRegistry,
    theme: Arc<ThemeEngine>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(registry: PluginRegistry, theme: Arc<ThemeEngine>) -> Self {
        Self::with_config(registry, theme, OrchestratorConfig::default())
    }

    pub fn with_config(
        registry: PluginRegistry,
        theme: Arc<ThemeEngine>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            theme,
            config,
        }
    }

    /// Run one export pass over the ordered entry sequence.
    ///
    /// Always returns a complete `ExportRun`: exactly one outcome per entry,
    /// in declared order.
    #[tracing::instrument(skip_all, fields(entries = entries.len()))]
    pub async fn run(
        &self,
        entries: Vec<ConfigEntry>,
        datasets: Arc<DatasetMap>,
        cancel: CancellationToken,
    ) -> ExportRun {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = entries.len();
        tracing::info!(run_id = %id, entries = total, "starting export run");

        // Identity of each slot, kept so a slot can be filled even if its
        // task dies without reporting (plugin panic).
        let identities: Vec<_> = entries
            .iter()
            .map(|e| (e.label.clone(), e.plugin.clone(), e.kind))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut tasks = JoinSet::new();
        let mut outcomes: Vec<Option<EntryOutcome>> = (0..total).map(|_| None).collect();

        for (index, entry) in entries.into_iter().enumerate() {
            let permit = if cancel.is_cancelled() {
                None
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                }
            };
            let Some(permit) = permit else {
                tracing::debug!(label = %entry.label, "entry cancelled before dispatch");
                outcomes[index] = Some(EntryOutcome {
                    label: entry.label,
                    plugin: entry.plugin,
                    kind: entry.kind,
                    status: EntryStatus::Cancelled,
                });
                continue;
            };

            let registry = self.registry.clone();
            let theme = Arc::clone(&self.theme);
            let datasets = Arc::clone(&datasets);
            let strictness = self.config.strictness;
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = process_entry(registry, theme, datasets, strictness, entry).await;
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(join_error) => {
                    tracing::error!(error = %join_error, "entry task aborted");
                }
            }
        }

        let outcomes = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let (label, plugin, kind) = identities[index].clone();
                    EntryOutcome {
                        label,
                        plugin: plugin.clone(),
                        kind,
                        status: EntryStatus::Failed(RenderError::plugin(
                            plugin,
                            "render task panicked",
                        )),
                    }
                })
            })
            .collect();

        let run = ExportRun {
            id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        tracing::info!(
            run_id = %id,
            rendered = run.rendered_count(),
            failed = run.failed_count(),
            cancelled = run.cancelled_count(),
            "export run finished"
        );
        run
    }
}

async fn process_entry(
    registry: PluginRegistry,
    theme: Arc<ThemeEngine>,
    datasets: Arc<DatasetMap>,
    strictness: Strictness,
    entry: ConfigEntry,
) -> EntryOutcome {
    let status = match execute_entry(&registry, theme, &datasets, strictness, &entry).await {
        Ok(results) => {
            tracing::info!(label = %entry.label, artifacts = results.len(), "entry rendered");
            EntryStatus::Rendered(results)
        }
        Err(error) => {
            tracing::warn!(label = %entry.label, kind = error.kind_name(), error = %error, "entry failed");
            EntryStatus::Failed(error)
        }
    };
    EntryOutcome {
        label: entry.label,
        plugin: entry.plugin,
        kind: entry.kind,
        status,
    }
}

/// Per-entry contract: registry resolve, config validation, data binding,
/// plugin invocation. Any error is captured by the caller.
async fn execute_entry(
    registry: &PluginRegistry,
    theme: Arc<ThemeEngine>,
    datasets: &DatasetMap,
    strictness: Strictness,
    entry: &ConfigEntry,
) -> Result<Vec<RenderResult>, RenderError> {
    let plugin = registry.resolve(entry.kind, &entry.plugin).await?;
    let descriptor = plugin.descriptor();

    let config = validate(&entry.params, &descriptor.config_schema, strictness)?;

    let binding = DataSourceBinding {
        source_name: entry.data_source.clone(),
        fields_used: plugin.fields_used(&config),
        shape: descriptor.data_shape,
    };
    let resolved = resolve(&binding, datasets)?;

    let ctx = RenderContext {
        label: entry.label.clone(),
        source: resolved.source,
        input: resolved.input,
        config,
        theme,
    };
    plugin.render(ctx).await
}
