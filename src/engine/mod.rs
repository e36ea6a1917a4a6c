// src/engine/mod.rs

//! Orchestration engine for docci.
//!
//! This module ties together:
//! - path discovery and document reading
//! - block extraction and filtering
//! - the block executor
//! - the process registry and teardown
//!
//! The pure bookkeeping state machine lives in [`core`]; the async/IO shell
//! is implemented in [`orchestrator`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub mod core;
pub mod orchestrator;

pub use self::core::{Flow, RunCore};
pub use orchestrator::Orchestrator;

/// Kind of block failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    AssertionFailed,
    CommandFailed,
}

/// The first (or, when collecting, every) failing block of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSummary {
    /// Configured path the file was discovered from.
    pub group: String,
    /// Every file of that group.
    pub files: Vec<PathBuf>,
    /// The file holding the failing block.
    pub file: PathBuf,
    pub index: usize,
    pub kind: FailureKind,
    pub diagnostic: String,
    pub command: String,
}

impl fmt::Display for FailureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error({},[{}])[#{}]: {}",
            self.group,
            join_paths(&self.files),
            self.index,
            self.diagnostic
        )
    }
}

/// A group that could not be processed (unreadable file, invalid tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    pub group: String,
    pub files: Vec<PathBuf>,
    pub message: String,
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error({},[{}]): {}",
            self.group,
            join_paths(&self.files),
            self.message
        )
    }
}

fn join_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The error a run reports; its `Display` is the line shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("Setup error: {0}")]
    Setup(String),

    #[error("{0}")]
    Block(FailureSummary),

    /// Every failure of the file that failed, in `collect_per_file` mode.
    #[error("{}", join_lines(.0))]
    Blocks(Vec<FailureSummary>),

    #[error("{}", join_lines(.0))]
    Groups(Vec<GroupFailure>),

    #[error("Interrupted by user")]
    Interrupted,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedResult {
    /// Non-empty block outputs in execution order.
    pub outputs: Vec<String>,
    pub failures: Vec<FailureSummary>,
    pub group_failures: Vec<GroupFailure>,
    pub setup_error: Option<String>,
    pub interrupted: bool,
}

impl AggregatedResult {
    pub fn first_failure(&self) -> Option<&FailureSummary> {
        self.failures.first()
    }

    pub fn is_success(&self) -> bool {
        self.setup_error.is_none()
            && self.failures.is_empty()
            && self.group_failures.is_empty()
            && !self.interrupted
    }

    /// Collected outputs, newline-joined.
    pub fn output(&self) -> String {
        self.outputs.join("\n")
    }

    /// The run's final verdict.
    ///
    /// A setup error wins over block failures, block failures over an
    /// interrupt, and an interrupt over group failures.
    pub fn into_result(self) -> Result<String, RunError> {
        if let Some(msg) = self.setup_error {
            return Err(RunError::Setup(msg));
        }

        let mut failures = self.failures;
        match failures.len() {
            0 => {}
            1 => return Err(RunError::Block(failures.remove(0))),
            _ => return Err(RunError::Blocks(failures)),
        }

        if self.interrupted {
            return Err(RunError::Interrupted);
        }
        if !self.group_failures.is_empty() {
            return Err(RunError::Groups(self.group_failures));
        }

        Ok(self.outputs.join("\n"))
    }
}
