// src/lib.rs

pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod filter;
pub mod fs;
pub mod logging;
pub mod markdown;
pub mod tags;
pub mod types;

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{LoadedConfig, RunConfig};
use crate::discovery::discover_groups;
use crate::engine::{AggregatedResult, Orchestrator};
use crate::exec::{CommandExecutor, ProcessRegistry};
use crate::filter::{Eligibility, TagFilter};
use crate::fs::{FileSystem, RealFileSystem};
use crate::markdown::extract_blocks;
use crate::tags::TagCatalog;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - legacy-option warnings
/// - dry-run reporting
/// - Ctrl-C handling
/// - the orchestrator with the real executor
pub async fn run(args: CliArgs, loaded: LoadedConfig) -> Result<()> {
    for warning in &loaded.warnings {
        warn!("{warning}");
    }

    if args.dry_run {
        let report = dry_run_report(&loaded.config, &RealFileSystem, &TagCatalog::builtin());
        print!("{report}");
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let cancel = CancellationToken::new();

    // Ctrl-C → cooperative cancellation; teardown still runs.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("interrupt received; stopping after teardown");
            cancel.cancel();
        });
    }

    let result = run_documentation(loaded.config, cancel).await;
    let output = result.into_result()?;

    if !output.is_empty() {
        println!("{output}");
    }
    info!("all documentation blocks passed");
    Ok(())
}

/// Run every configured document with the real filesystem and shell.
pub async fn run_documentation(config: RunConfig, cancel: CancellationToken) -> AggregatedResult {
    let registry = Arc::new(ProcessRegistry::new());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let catalog = Arc::new(TagCatalog::builtin());

    let executor = CommandExecutor::new(&config, Arc::clone(&registry), Arc::clone(&fs), cancel.clone());
    let orchestrator = Orchestrator::new(config, catalog, fs, executor, registry, cancel);
    orchestrator.run().await
}

/// Describe which blocks would run, without executing anything.
pub fn dry_run_report(config: &RunConfig, fs: &dyn FileSystem, catalog: &TagCatalog) -> String {
    let filter = TagFilter::new(Arc::new(catalog.clone()), config);
    let mut out = String::from("docci dry-run\n");

    for group in discover_groups(fs, config.paths(), config.supported_file_extensions()) {
        let _ = writeln!(out, "{}:", group.key);

        for file in &group.files {
            let content = match fs.read_to_string(file) {
                Ok(content) => content,
                Err(e) => {
                    let _ = writeln!(out, "  {}: unreadable ({e:#})", file.display());
                    continue;
                }
            };
            let blocks = match extract_blocks(&content, file, catalog) {
                Ok(blocks) => blocks,
                Err(e) => {
                    let _ = writeln!(out, "  {}: {e}", file.display());
                    continue;
                }
            };

            let _ = writeln!(out, "  {} ({} blocks)", file.display(), blocks.len());
            for block in &blocks {
                let verdict = match filter.evaluate(block) {
                    Eligibility::Eligible(mode) => format!("run ({mode:?})"),
                    Eligibility::Skipped(reason) => format!("skip ({reason})"),
                };
                let _ = writeln!(
                    out,
                    "    [#{}] line {} `{}`: {verdict}",
                    block.index(),
                    block.line(),
                    block.language()
                );
            }
        }
    }

    out
}
