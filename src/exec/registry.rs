// src/exec/registry.rs

//! Tracking of every process spawned during a run.
//!
//! Each spawn is registered before it is awaited. Foreground commands keep
//! ownership of their `Child` and only leave their pid here; background
//! commands hand their `Child` over to the registry. [`ProcessRegistry::cleanup_all`]
//! terminates whatever is still registered and empties the table.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, info, warn};

/// Time between SIGTERM and SIGKILL.
pub const TERMINATE_GRACE: Duration = Duration::from_millis(500);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessToken(u64);

#[derive(Debug)]
pub struct ManagedProcess {
    /// Leader of the process group created for the spawn.
    pub pid: Option<u32>,
    pub description: String,
    /// Present when the registry owns the child (background commands).
    pub child: Option<Child>,
}

impl ManagedProcess {
    fn is_alive(&mut self) -> bool {
        if let Some(child) = self.child.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                return true;
            }
        }
        self.pid.is_some_and(group_alive)
    }
}

#[derive(Debug, Default)]
struct Inner {
    next: u64,
    entries: BTreeMap<ProcessToken, ManagedProcess>,
}

#[derive(Debug, Default)]
pub struct ProcessRegistry {
    inner: Mutex<Inner>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(
        &self,
        pid: Option<u32>,
        description: impl Into<String>,
        child: Option<Child>,
    ) -> ProcessToken {
        let mut inner = self.lock();
        let token = ProcessToken(inner.next);
        inner.next += 1;

        let description = description.into();
        debug!(?pid, cmd = %description, "registered process");
        inner.entries.insert(
            token,
            ManagedProcess {
                pid,
                description,
                child,
            },
        );
        token
    }

    /// Release a foreground process after it exited.
    ///
    /// If the exited leader left other members of its process group running
    /// (e.g. `cmd &`), the entry stays so `cleanup_all` still reaches them.
    pub fn deregister(&self, token: ProcessToken) {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(&token) else {
            return;
        };

        if entry.is_alive() {
            debug!(pid = ?entry.pid, cmd = %entry.description, "process group outlived its leader");
            return;
        }
        inner.entries.remove(&token);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Terminate every registered process and clear the table.
    ///
    /// Sends SIGTERM to each process group, waits up to
    /// [`TERMINATE_GRACE`], then SIGKILLs whatever is left. Never fails and
    /// is safe to call repeatedly.
    pub async fn cleanup_all(&self) {
        let mut procs: Vec<ManagedProcess> = {
            let mut inner = self.lock();
            std::mem::take(&mut inner.entries).into_values().collect()
        };

        if procs.is_empty() {
            return;
        }
        info!(count = procs.len(), "terminating remaining processes");

        for proc in procs.iter_mut() {
            report_early_exit(proc);
            if proc.is_alive() {
                terminate(proc);
            }
        }

        let deadline = tokio::time::Instant::now() + TERMINATE_GRACE;
        while procs.iter_mut().any(ManagedProcess::is_alive) {
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        for proc in procs.iter_mut() {
            if proc.is_alive() {
                warn!(pid = ?proc.pid, cmd = %proc.description, "process ignored SIGTERM; killing");
                kill(proc);
            }
            if let Some(child) = proc.child.as_mut() {
                let _ = child.wait().await;
            }
        }
    }
}

fn report_early_exit(proc: &mut ManagedProcess) {
    let Some(child) = proc.child.as_mut() else {
        return;
    };
    if let Ok(Some(status)) = child.try_wait() {
        if !status.success() {
            warn!(
                cmd = %proc.description,
                exit_code = status.code().unwrap_or(-1),
                "background command exited with failure"
            );
        }
    }
}

#[cfg(unix)]
fn group_alive(pid: u32) -> bool {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    killpg(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
fn group_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), signal) {
        debug!(pid, ?signal, error = %e, "failed to signal process group");
    }
}

/// SIGTERM the process group of `pid`.
#[cfg(unix)]
pub fn terminate_group(pid: u32) {
    signal_group(pid, nix::sys::signal::Signal::SIGTERM);
}

#[cfg(not(unix))]
pub fn terminate_group(_pid: u32) {}

#[cfg(unix)]
pub fn kill_group(pid: u32) {
    signal_group(pid, nix::sys::signal::Signal::SIGKILL);
}

#[cfg(not(unix))]
pub fn kill_group(_pid: u32) {}

fn terminate(proc: &mut ManagedProcess) {
    match proc.pid {
        Some(pid) => terminate_group(pid),
        None => kill(proc),
    }
}

fn kill(proc: &mut ManagedProcess) {
    if let Some(pid) = proc.pid {
        kill_group(pid);
    }
    if let Some(child) = proc.child.as_mut() {
        let _ = child.start_kill();
    }
}
