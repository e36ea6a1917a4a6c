// src/exec/backend.rs

//! Pluggable block executor abstraction.
//!
//! The orchestrator talks to a `BlockExecutor` instead of spawning processes
//! itself. Production code uses [`CommandExecutor`](super::CommandExecutor);
//! tests swap in a fake that records which blocks were run and returns
//! scripted outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::env::Environment;
use crate::exec::outcome::ExecutionOutcome;
use crate::markdown::CodeBlock;
use crate::types::ExecutionMode;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which lifecycle hook a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// `pre_cmds`: failures abort the run; exported variables are kept.
    Setup,
    /// `cleanup_cmds`: run even after an interrupt; failures are only logged.
    Cleanup,
}

/// Trait abstracting how an eligible block is executed.
pub trait BlockExecutor: Send + Sync {
    /// Run every command of `block` with `env` as the base environment.
    fn run_block<'a>(
        &'a self,
        block: &'a CodeBlock,
        mode: ExecutionMode,
        env: &'a Environment,
    ) -> BoxFuture<'a, ExecutionOutcome>;

    /// Run one setup or cleanup command; returns the environment the
    /// command left behind.
    fn run_hook<'a>(
        &'a self,
        command: &'a str,
        phase: HookPhase,
        env: &'a Environment,
    ) -> BoxFuture<'a, Result<Environment>>;
}
