use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use docci::errors::{DocciError, Result};
use docci::exec::{BlockExecutor, BoxFuture, Environment, ExecutionOutcome, HookPhase};
use docci::markdown::CodeBlock;
use docci::types::ExecutionMode;

/// One call the orchestrator made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Block {
        file: PathBuf,
        index: usize,
        mode: ExecutionMode,
    },
    Hook {
        command: String,
        phase: HookPhase,
    },
}

/// A fake executor that:
/// - records every block and hook it was asked to run
/// - answers blocks with a scripted outcome, or `Success` carrying the
///   block script as output
/// - fails the hooks it was told to fail.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    calls: Arc<Mutex<Vec<FakeCall>>>,
    envs: Arc<Mutex<Vec<Environment>>>,
    outcomes: HashMap<(String, usize), ExecutionOutcome>,
    failing_hooks: HashSet<String>,
    exported: Vec<(String, String)>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer block `index` of every file whose path ends with `file`.
    pub fn with_outcome(mut self, file: &str, index: usize, outcome: ExecutionOutcome) -> Self {
        self.outcomes.insert((file.to_string(), index), outcome);
        self
    }

    pub fn failing_hook(mut self, command: &str) -> Self {
        self.failing_hooks.insert(command.to_string());
        self
    }

    /// Setup hooks add this variable to the returned environment.
    pub fn exporting(mut self, key: &str, value: &str) -> Self {
        self.exported.push((key.to_string(), value.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    /// `(file, index)` of every block run, in order.
    pub fn executed_blocks(&self) -> Vec<(PathBuf, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Block { file, index, .. } => Some((file, index)),
                FakeCall::Hook { .. } => None,
            })
            .collect()
    }

    pub fn hooks(&self, phase: HookPhase) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Hook { command, phase: p } if p == phase => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Environment each block was given, in order.
    pub fn block_envs(&self) -> Vec<Environment> {
        self.envs.lock().unwrap().clone()
    }

    fn scripted(&self, block: &CodeBlock) -> Option<ExecutionOutcome> {
        self.outcomes
            .iter()
            .find(|((file, index), _)| *index == block.index() && block.source().ends_with(file))
            .map(|(_, outcome)| outcome.clone())
    }
}

impl BlockExecutor for FakeExecutor {
    fn run_block<'a>(
        &'a self,
        block: &'a CodeBlock,
        mode: ExecutionMode,
        env: &'a Environment,
    ) -> BoxFuture<'a, ExecutionOutcome> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(FakeCall::Block {
                file: block.source().to_path_buf(),
                index: block.index(),
                mode,
            });
            self.envs.lock().unwrap().push(env.clone());

            self.scripted(block)
                .unwrap_or_else(|| ExecutionOutcome::success(block.script()))
        })
    }

    fn run_hook<'a>(
        &'a self,
        command: &'a str,
        phase: HookPhase,
        env: &'a Environment,
    ) -> BoxFuture<'a, Result<Environment>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(FakeCall::Hook {
                command: command.to_string(),
                phase,
            });

            if self.failing_hooks.contains(command) {
                return Err(DocciError::SetupError(format!("`{command}` failed")));
            }

            let mut env = env.clone();
            if phase == HookPhase::Setup {
                env.extend(self.exported.iter().cloned());
            }
            Ok(env)
        })
    }
}
