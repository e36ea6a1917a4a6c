// src/engine/orchestrator.rs

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::discovery::{discover_groups, FileGroup};
use crate::exec::{BlockExecutor, Environment, ExecutionOutcome, HookPhase, ProcessRegistry};
use crate::filter::{Eligibility, TagFilter};
use crate::fs::FileSystem;
use crate::markdown::extract_blocks;
use crate::tags::TagCatalog;

use super::core::{Flow, RunCore};
use super::AggregatedResult;

/// Drives one run: setup, every group in order, then teardown.
///
/// This is the async shell around [`RunCore`], which holds the run
/// semantics. The orchestrator does the IO: reading documents, calling the
/// executor and cleaning up.
pub struct Orchestrator<E: BlockExecutor> {
    config: RunConfig,
    catalog: Arc<TagCatalog>,
    filter: TagFilter,
    fs: Arc<dyn FileSystem>,
    executor: E,
    registry: Arc<ProcessRegistry>,
    cancel: CancellationToken,
    base_env: Environment,
}

impl<E: BlockExecutor> fmt::Debug for Orchestrator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl<E: BlockExecutor> Orchestrator<E> {
    pub fn new(
        config: RunConfig,
        catalog: Arc<TagCatalog>,
        fs: Arc<dyn FileSystem>,
        executor: E,
        registry: Arc<ProcessRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        let filter = TagFilter::new(Arc::clone(&catalog), &config);
        Self {
            config,
            catalog,
            filter,
            fs,
            executor,
            registry,
            cancel,
            base_env: Environment::from_process(),
        }
    }

    /// Replace the inherited process environment (tests).
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.base_env = env;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run to completion. Teardown happens exactly once, whatever happened
    /// before it.
    pub async fn run(self) -> AggregatedResult {
        let mut core = RunCore::new(self.config.failure_mode());
        info!(paths = ?self.config.paths(), "starting documentation run");

        let env = match self.setup().await {
            Ok(env) => {
                self.run_groups(&mut core, &env).await;
                env
            }
            Err(message) => {
                if self.cancel.is_cancelled() {
                    core.interrupted();
                } else {
                    core.setup_failed(message);
                }
                self.base_env.clone()
            }
        };

        self.teardown(&env).await;

        let result = core.finish();
        debug!(
            outputs = result.outputs.len(),
            failures = result.failures.len(),
            group_failures = result.group_failures.len(),
            interrupted = result.interrupted,
            "run finished"
        );
        result
    }

    /// Run `pre_cmds`, keeping what they export, then apply `env_vars`.
    async fn setup(&self) -> Result<Environment, String> {
        let mut env = self.base_env.clone();

        for command in self.config.pre_cmds() {
            if self.cancel.is_cancelled() {
                return Err("Interrupted by user".to_string());
            }
            info!(cmd = %command, "running pre command");
            env = self
                .executor
                .run_hook(command, HookPhase::Setup, &env)
                .await
                .map_err(|e| match e {
                    crate::errors::DocciError::SetupError(msg) => msg,
                    other => other.to_string(),
                })?;
        }

        env.extend(
            self.config
                .env_vars()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(env)
    }

    async fn run_groups(&self, core: &mut RunCore, env: &Environment) {
        let groups = discover_groups(
            self.fs.as_ref(),
            self.config.paths(),
            self.config.supported_file_extensions(),
        );

        for group in &groups {
            if self.run_group(core, group, env).await == Flow::Halt {
                return;
            }
        }
    }

    async fn run_group(&self, core: &mut RunCore, group: &FileGroup, env: &Environment) -> Flow {
        for file in &group.files {
            if self.cancel.is_cancelled() {
                core.interrupted();
                return Flow::Halt;
            }

            let content = match self.fs.read_to_string(file) {
                Ok(content) => content,
                Err(e) => {
                    warn!(group = %group.key, file = %file.display(), error = %e, "failed to read document");
                    core.record_group_error(group, format!("{e:#}"));
                    return Flow::Continue;
                }
            };

            let blocks = match extract_blocks(&content, file, &self.catalog) {
                Ok(blocks) => blocks,
                Err(e) => {
                    warn!(group = %group.key, file = %file.display(), error = %e, "failed to extract blocks");
                    core.record_group_error(group, e.to_string());
                    return Flow::Continue;
                }
            };

            debug!(file = %file.display(), blocks = blocks.len(), "processing document");

            for block in &blocks {
                if self.cancel.is_cancelled() {
                    core.interrupted();
                    return Flow::Halt;
                }

                let outcome = match self.filter.evaluate(block) {
                    Eligibility::Skipped(reason) => {
                        debug!(file = %file.display(), block = block.index(), %reason, "block skipped");
                        ExecutionOutcome::skipped(reason)
                    }
                    Eligibility::Eligible(mode) => {
                        debug!(file = %file.display(), block = block.index(), ?mode, "running block");
                        self.executor.run_block(block, mode, env).await
                    }
                };

                if outcome.is_failure() {
                    warn!(
                        file = %file.display(),
                        block = block.index(),
                        kind = outcome.kind(),
                        diagnostic = outcome.diagnostic().unwrap_or_default(),
                        "block failed"
                    );
                }

                if core.record_block(group, file, block.index(), outcome) == Flow::Halt {
                    return Flow::Halt;
                }
            }

            if core.file_finished() == Flow::Halt {
                return Flow::Halt;
            }
        }

        Flow::Continue
    }

    /// Terminate registered processes, then run `cleanup_cmds`. Failures
    /// are logged only.
    async fn teardown(&self, env: &Environment) {
        self.registry.cleanup_all().await;

        for command in self.config.cleanup_cmds() {
            info!(cmd = %command, "running cleanup command");
            if let Err(e) = self.executor.run_hook(command, HookPhase::Cleanup, env).await {
                warn!(cmd = %command, error = %e, "cleanup command failed");
            }
        }

        // Cleanup commands may have started processes of their own.
        self.registry.cleanup_all().await;
    }
}
