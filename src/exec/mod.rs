// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the commands of eligible blocks through a real shell
//! using `tokio::process::Command` and reports a structured
//! [`ExecutionOutcome`] back to the orchestrator.
//!
//! - [`backend`] provides the `BlockExecutor` trait the orchestrator uses,
//!   which tests replace with a fake implementation.
//! - [`executor`] is the production `CommandExecutor`.
//! - [`registry`] tracks every spawned process until teardown.
//! - [`directives`] turns annotations into typed settings and skip guards.
//! - [`env`], [`shell`], [`endpoint`] and [`file_ops`] are helpers for the
//!   executor.

pub mod backend;
pub mod directives;
pub mod endpoint;
pub mod env;
pub mod executor;
pub mod file_ops;
pub mod outcome;
pub mod registry;
pub mod shell;

pub use backend::{BlockExecutor, BoxFuture, HookPhase};
pub use env::Environment;
pub use executor::CommandExecutor;
pub use outcome::{ExecutionOutcome, SkipReason};
pub use registry::ProcessRegistry;
