// src/engine/core.rs

//! Pure run bookkeeping.
//!
//! [`RunCore`] consumes block outcomes and group errors and decides whether
//! the orchestrator continues, moves on, or halts. It has no Tokio types,
//! does no IO and is unit tested in isolation.

use std::path::Path;

use crate::discovery::FileGroup;
use crate::engine::{AggregatedResult, FailureKind, FailureSummary, GroupFailure};
use crate::exec::ExecutionOutcome;
use crate::types::FailureMode;

/// What the orchestrator does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Carry on with the next block (or file).
    Continue,
    /// Stop everything and go to teardown.
    Halt,
}

#[derive(Debug)]
pub struct RunCore {
    mode: FailureMode,
    result: AggregatedResult,
    file_failed: bool,
}

impl RunCore {
    pub fn new(mode: FailureMode) -> Self {
        Self {
            mode,
            result: AggregatedResult::default(),
            file_failed: false,
        }
    }

    pub fn setup_failed(&mut self, message: impl Into<String>) {
        self.result.setup_error = Some(message.into());
    }

    pub fn interrupted(&mut self) {
        self.result.interrupted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.result.setup_error.is_some()
            || self.result.interrupted
            || (self.mode == FailureMode::FailFast && !self.result.failures.is_empty())
    }

    /// Record the outcome of block `index` of `file`.
    pub fn record_block(
        &mut self,
        group: &FileGroup,
        file: &Path,
        index: usize,
        outcome: ExecutionOutcome,
    ) -> Flow {
        let kind = match &outcome {
            ExecutionOutcome::Success { output } | ExecutionOutcome::Skipped { output, .. } => {
                if !output.trim().is_empty() {
                    self.result.outputs.push(output.clone());
                }
                return Flow::Continue;
            }
            ExecutionOutcome::Interrupted { .. } => {
                self.interrupted();
                return Flow::Halt;
            }
            ExecutionOutcome::AssertionFailed { .. } => FailureKind::AssertionFailed,
            ExecutionOutcome::CommandFailed { .. } => FailureKind::CommandFailed,
        };

        self.result.failures.push(FailureSummary {
            group: group.key.clone(),
            files: group.files.clone(),
            file: file.to_path_buf(),
            index,
            kind,
            diagnostic: outcome.diagnostic().unwrap_or_default().to_string(),
            command: outcome.command().unwrap_or_default().to_string(),
        });

        match self.mode {
            FailureMode::FailFast => Flow::Halt,
            FailureMode::CollectPerFile => {
                self.file_failed = true;
                Flow::Continue
            }
        }
    }

    /// A group could not be processed; the run moves on to the next group.
    pub fn record_group_error(&mut self, group: &FileGroup, message: impl Into<String>) {
        self.result.group_failures.push(GroupFailure {
            group: group.key.clone(),
            files: group.files.clone(),
            message: message.into(),
        });
    }

    /// Called after the last block of a file.
    pub fn file_finished(&mut self) -> Flow {
        if std::mem::take(&mut self.file_failed) {
            Flow::Halt
        } else {
            Flow::Continue
        }
    }

    pub fn result(&self) -> &AggregatedResult {
        &self.result
    }

    pub fn finish(self) -> AggregatedResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::exec::SkipReason;

    fn group() -> FileGroup {
        FileGroup {
            key: "docs".into(),
            files: vec![PathBuf::from("docs/a.md")],
        }
    }

    #[test]
    fn outputs_are_kept_in_order_and_empty_ones_dropped() {
        let mut core = RunCore::new(FailureMode::FailFast);
        let g = group();
        let file = Path::new("docs/a.md");

        assert_eq!(core.record_block(&g, file, 0, ExecutionOutcome::success("one")), Flow::Continue);
        assert_eq!(core.record_block(&g, file, 1, ExecutionOutcome::success("  ")), Flow::Continue);
        assert_eq!(
            core.record_block(&g, file, 2, ExecutionOutcome::skipped(SkipReason::Annotated)),
            Flow::Continue
        );
        assert_eq!(core.record_block(&g, file, 3, ExecutionOutcome::success("two")), Flow::Continue);

        assert_eq!(core.finish().outputs, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn fail_fast_halts_on_first_failure() {
        let mut core = RunCore::new(FailureMode::FailFast);
        let g = group();
        let flow = core.record_block(
            &g,
            Path::new("docs/a.md"),
            4,
            ExecutionOutcome::missing_output("FOO", "echo bar"),
        );

        assert_eq!(flow, Flow::Halt);
        assert!(core.is_halted());
        let failure = core.result().first_failure().cloned().unwrap();
        assert_eq!(failure.index, 4);
        assert_eq!(failure.kind, FailureKind::AssertionFailed);
        assert_eq!(failure.group, "docs");
    }

    #[test]
    fn collect_mode_finishes_the_file_then_halts() {
        let mut core = RunCore::new(FailureMode::CollectPerFile);
        let g = group();
        let file = Path::new("docs/a.md");

        let failed = ExecutionOutcome::command_failed("boom", "false");
        assert_eq!(core.record_block(&g, file, 0, failed.clone()), Flow::Continue);
        assert_eq!(core.record_block(&g, file, 1, ExecutionOutcome::success("ok")), Flow::Continue);
        assert_eq!(core.record_block(&g, file, 2, failed), Flow::Continue);
        assert_eq!(core.file_finished(), Flow::Halt);

        let result = core.finish();
        let indices: Vec<usize> = result.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn interrupt_halts() {
        let mut core = RunCore::new(FailureMode::CollectPerFile);
        let flow = core.record_block(
            &group(),
            Path::new("docs/a.md"),
            0,
            ExecutionOutcome::interrupted("sleep 10"),
        );
        assert_eq!(flow, Flow::Halt);
        assert!(core.finish().interrupted);
    }
}
