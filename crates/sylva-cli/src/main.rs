//! Sylva CLI — run export passes from a YAML site configuration.
//!
//! `sylva export` reads the site configuration and the upstream dataset
//! mapping, renders every configured widget/exporter, writes the artifacts
//! under the output root and prints a per-entry report. Partial success is
//! a normal outcome; only an unreadable configuration or dataset file
//! aborts the run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use sylva_cli::init_tracing;
use sylva_core::artifact::{EntryStatus, ExportRun};
use sylva_core::dataset::load_datasets;
use sylva_core::schema::{validate, Strictness};
use sylva_core::site_config::SiteConfig;
use sylva_output::OutputWriter;
use sylva_plugins::{builtin_registry, ThemeEngine};
use sylva_render::{Orchestrator, OrchestratorConfig};

#[derive(Parser)]
#[command(name = "sylva", about = "Plugin-driven widget rendering and export pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every configured widget/exporter and write the artifacts
    Export {
        /// Site configuration (YAML)
        #[arg(long)]
        config: PathBuf,
        /// Dataset mapping produced by the transform stage (JSON)
        #[arg(long)]
        datasets: PathBuf,
        /// Output root directory
        #[arg(long, default_value = "dist")]
        out: PathBuf,
        /// Upper bound on concurrently rendered entries
        #[arg(long, default_value_t = 4)]
        max_workers: usize,
        /// Pass unknown configuration keys through instead of rejecting them
        #[arg(long)]
        lenient: bool,
    },
    /// Check a site configuration against the plugin schemas without rendering
    Validate {
        /// Site configuration (YAML)
        #[arg(long)]
        config: PathBuf,
    },
    /// List the registered plugins
    Plugins,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            config,
            datasets,
            out,
            max_workers,
            lenient,
        } => export(config, datasets, out, max_workers, lenient).await,
        Commands::Validate { config } => validate_config(config).await,
        Commands::Plugins => list_plugins().await,
    }
}

async fn export(
    config_path: PathBuf,
    datasets_path: PathBuf,
    out: PathBuf,
    max_workers: usize,
    lenient: bool,
) -> Result<()> {
    let entries = SiteConfig::load(&config_path)?.into_entries();
    let datasets = Arc::new(load_datasets(&datasets_path)?);

    let registry = builtin_registry()
        .await
        .context("failed to register built-in plugins")?;
    let theme = Arc::new(ThemeEngine::new().context("failed to build theme engine")?);
    let orchestrator = Orchestrator::with_config(
        registry,
        theme,
        OrchestratorConfig {
            max_workers,
            strictness: if lenient {
                Strictness::Lenient
            } else {
                Strictness::Strict
            },
        },
    );

    // Ctrl-C stops dispatching new entries; in-flight entries finish.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("cancellation requested, finishing in-flight entries");
            signal_cancel.cancel();
        }
    });

    let run = orchestrator.run(entries, datasets, cancel).await;
    print_run_report(&run);

    let rendered = run.rendered_count();
    let failed = run.failed_count();
    let cancelled = run.cancelled_count();

    let summary = OutputWriter::new(&out).flush(run).await;
    println!(
        "{} artifact(s) written under {}",
        summary.written_count(),
        out.display()
    );
    for failure in &summary.failed {
        println!(
            "  write failed for {} at {}: {}",
            failure.label,
            failure.path.display(),
            failure.error
        );
    }
    println!("entries: {rendered} rendered, {failed} failed, {cancelled} cancelled");
    Ok(())
}

fn print_run_report(run: &ExportRun) {
    println!("export run {}", run.id);
    for outcome in &run.outcomes {
        match &outcome.status {
            EntryStatus::Rendered(results) => {
                let paths: Vec<String> = results
                    .iter()
                    .map(|r| r.target_path.display().to_string())
                    .collect();
                println!("  ok      {} -> {}", outcome.label, paths.join(", "));
            }
            EntryStatus::Failed(error) => {
                println!(
                    "  error   {} [{}] {}",
                    outcome.label,
                    error.kind_name(),
                    error
                );
            }
            EntryStatus::Cancelled => {
                println!("  skipped {} (cancelled)", outcome.label);
            }
        }
    }
}

async fn validate_config(config_path: PathBuf) -> Result<()> {
    let entries = SiteConfig::load(&config_path)?.into_entries();
    let registry = builtin_registry()
        .await
        .context("failed to register built-in plugins")?;

    let mut error_count = 0usize;
    for entry in &entries {
        let result = match registry.resolve(entry.kind, &entry.plugin).await {
            Ok(plugin) => validate(
                &entry.params,
                &plugin.descriptor().config_schema,
                Strictness::Strict,
            )
            .map(|_| ()),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => println!("  ok    {}", entry.label),
            Err(err) => {
                error_count += 1;
                println!("  error {} {}", entry.label, err);
            }
        }
    }

    if error_count > 0 {
        anyhow::bail!("configuration invalid: {error_count} of {} entries", entries.len());
    }
    println!("{} entries valid", entries.len());
    Ok(())
}

async fn list_plugins() -> Result<()> {
    let registry = builtin_registry()
        .await
        .context("failed to register built-in plugins")?;
    for descriptor in registry.list().await {
        println!(
            "{:<9} {:<16} {:<9} {}",
            descriptor.kind.to_string(),
            descriptor.name,
            descriptor.data_shape.to_string(),
            descriptor.description
        );
    }
    Ok(())
}
