// src/exec/executor.rs

//! Real block executor: spawns each command through the configured shell.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::errors::{DocciError, Result};
use crate::exec::backend::{BlockExecutor, BoxFuture, HookPhase};
use crate::exec::directives::BlockDirectives;
use crate::exec::endpoint::{wait_for_endpoint, EndpointStatus};
use crate::exec::env::Environment;
use crate::exec::file_ops::apply_file_directive;
use crate::exec::outcome::ExecutionOutcome;
use crate::exec::registry::{kill_group, ProcessRegistry};
use crate::exec::shell::{capture_script, ShellSpec, ENV_DUMP_VAR};
use crate::fs::FileSystem;
use crate::markdown::CodeBlock;
use crate::types::ExecutionMode;

/// Commands that stay in the foreground inside a background block.
pub const FOREGROUND_COMMANDS: [&str; 6] = ["cp", "export", "cd", "mkdir", "echo", "cat"];

/// How long to keep reading a pipe after the shell exited. A command
/// started with `&` inherits the pipe and may never close it.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(200);

enum Foreground {
    Exited {
        success: bool,
        code: Option<i32>,
        output: String,
        env: Option<Environment>,
    },
    Interrupted,
}

pub struct CommandExecutor {
    shell: ShellSpec,
    ignore_commands: Vec<String>,
    registry: Arc<ProcessRegistry>,
    fs: Arc<dyn FileSystem>,
    cancel: CancellationToken,
}

impl CommandExecutor {
    pub fn new(
        config: &RunConfig,
        registry: Arc<ProcessRegistry>,
        fs: Arc<dyn FileSystem>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            shell: ShellSpec::new(config.shell(), config.working_dir().map(PathBuf::from)),
            ignore_commands: config.ignore_commands().to_vec(),
            registry,
            fs,
            cancel,
        }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    fn is_ignored(&self, command: &str) -> bool {
        self.ignore_commands
            .iter()
            .any(|pattern| !pattern.is_empty() && command.contains(pattern.as_str()))
    }

    async fn execute_block(
        &self,
        block: &CodeBlock,
        mode: ExecutionMode,
        env: &Environment,
    ) -> ExecutionOutcome {
        let directives = match BlockDirectives::from_block(block) {
            Ok(d) => d,
            Err(msg) => return ExecutionOutcome::command_failed(msg, block.script()),
        };

        if self.cancel.is_cancelled() {
            return ExecutionOutcome::interrupted(block.script());
        }

        if let Some(reason) =
            directives.skip_reason(self.fs.as_ref(), env, self.shell.working_dir.as_deref())
        {
            info!(file = %block.source().display(), block = block.index(), %reason, "skipping block");
            return ExecutionOutcome::skipped(reason);
        }

        if let Some(wait) = &directives.endpoint {
            match wait_for_endpoint(wait, &self.cancel).await {
                EndpointStatus::Up => {}
                EndpointStatus::TimedOut => {
                    return ExecutionOutcome::command_failed(
                        format!("endpoint not up in timeout period: {}", wait.url),
                        wait.url.clone(),
                    );
                }
                EndpointStatus::Cancelled => return ExecutionOutcome::interrupted(wait.url.clone()),
            }
        }

        let outcome = match &directives.file {
            Some(file) => {
                match apply_file_directive(
                    self.fs.as_ref(),
                    file,
                    block.body(),
                    self.shell.working_dir.as_deref(),
                ) {
                    Ok(path) => {
                        info!(file = %path.display(), "wrote file from block");
                        ExecutionOutcome::success("")
                    }
                    Err(e) => ExecutionOutcome::command_failed(format!("{e:#}"), file.name.clone()),
                }
            }
            None => self.run_commands(block, mode, &directives, env).await,
        };

        if outcome.is_failure() || outcome.is_interrupted() {
            return outcome;
        }

        if let Some(delay) = directives.delay_after {
            debug!(?delay, "delay after block");
            if !self.sleep(delay).await {
                return ExecutionOutcome::interrupted(block.script());
            }
        }

        outcome
    }

    async fn run_commands(
        &self,
        block: &CodeBlock,
        mode: ExecutionMode,
        directives: &BlockDirectives,
        base_env: &Environment,
    ) -> ExecutionOutcome {
        let lines: Vec<&str> = block
            .commands()
            .iter()
            .map(String::as_str)
            .filter(|line| {
                let ignored = self.is_ignored(line);
                if ignored {
                    debug!(cmd = %line, "ignoring command");
                }
                !ignored
            })
            .collect();

        let units: Vec<String> = match mode {
            ExecutionMode::Session if !lines.is_empty() => vec![lines.join("\n")],
            ExecutionMode::Session => Vec::new(),
            ExecutionMode::LineByLine => lines.iter().map(|l| l.to_string()).collect(),
        };
        let strict = mode == ExecutionMode::Session;

        let mut env = base_env.clone();
        let mut output = String::new();
        let mut ran_foreground = false;
        let mut failed_as_expected = false;

        for unit in &units {
            if self.cancel.is_cancelled() {
                return ExecutionOutcome::interrupted(unit.clone());
            }

            if let Some(delay) = directives.delay_per_cmd {
                if !self.sleep(delay).await {
                    return ExecutionOutcome::interrupted(unit.clone());
                }
            }

            if directives.background && !runs_in_foreground(unit) {
                if let Err(e) = self.spawn_background(unit, &env) {
                    return ExecutionOutcome::command_failed(format!("{e:#}"), unit.clone());
                }
                continue;
            }

            ran_foreground = true;
            let result = match self.run_foreground(unit, &env, strict, &self.cancel).await {
                Ok(r) => r,
                Err(e) => return ExecutionOutcome::command_failed(format!("{e:#}"), unit.clone()),
            };

            match result {
                Foreground::Interrupted => return ExecutionOutcome::interrupted(unit.clone()),
                Foreground::Exited {
                    success,
                    code,
                    output: text,
                    env: next_env,
                } => {
                    output.push_str(&text);

                    if !success {
                        if directives.expect_failure {
                            debug!(cmd = %unit, ?code, "command failed as expected");
                            failed_as_expected = true;
                            break;
                        }
                        return ExecutionOutcome::exit_failure(&text, code, unit.clone());
                    }

                    if let Some(next_env) = next_env {
                        env = next_env;
                    }
                }
            }
        }

        if directives.expect_failure && ran_foreground && !failed_as_expected {
            return ExecutionOutcome::command_failed(
                "expected failure but command succeeded",
                block.script(),
            );
        }

        if let Some(needle) = &directives.output_contains {
            if !output.contains(needle.as_str()) {
                return ExecutionOutcome::missing_output(needle, block.script());
            }
        }

        ExecutionOutcome::success(output.trim_end())
    }

    /// Run `script` to completion, capturing combined output and the final
    /// environment.
    async fn run_foreground(
        &self,
        script: &str,
        env: &Environment,
        strict: bool,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Foreground> {
        let dump = tempfile::NamedTempFile::new().context("creating environment dump file")?;
        let mut child_env = env.clone();
        child_env.set(ENV_DUMP_VAR, dump.path().to_string_lossy());

        let mut cmd = self.shell.command(&capture_script(script, strict), &child_env);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(cmd = %script, "running command");
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning `{}` for `{script}`", self.shell.program))?;

        let pid = child.id();
        let token = self.registry.register(pid, script, None);

        let stdout = PipeCollector::spawn(child.stdout.take());
        let stderr = PipeCollector::spawn(child.stderr.take());

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(cmd = %script, "interrupt received; killing command");
                if let Some(pid) = pid {
                    kill_group(pid);
                }
                let _ = child.kill().await;
                self.registry.deregister(token);
                return Ok(Foreground::Interrupted);
            }
            status = child.wait() => status,
        };
        self.registry.deregister(token);
        let status = status.with_context(|| format!("waiting for `{script}`"))?;

        let mut output = stdout.finish().await;
        output.push_str(&stderr.finish().await);

        debug!(cmd = %script, exit_code = ?status.code(), "command exited");

        let next_env = match tokio::fs::read(dump.path()).await {
            Ok(bytes) if !bytes.is_empty() => {
                Some(Environment::from_env_dump(&bytes, &[ENV_DUMP_VAR]))
            }
            _ => None,
        };

        Ok(Foreground::Exited {
            success: status.success(),
            code: status.code(),
            output,
            env: next_env,
        })
    }

    /// Start `script` without waiting; the registry owns the child.
    fn spawn_background(&self, script: &str, env: &Environment) -> anyhow::Result<()> {
        let mut cmd = self.shell.command(script, env);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning background `{script}`"))?;

        log_lines(child.stdout.take(), script.to_string());
        log_lines(child.stderr.take(), script.to_string());

        let pid = child.id();
        info!(cmd = %script, ?pid, "started background command");
        self.registry.register(pid, script, Some(child));
        Ok(())
    }

    /// Sleep unless interrupted; false when the run was cancelled.
    async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }

    async fn execute_hook(
        &self,
        command: &str,
        phase: HookPhase,
        env: &Environment,
    ) -> Result<Environment> {
        // Cleanup runs after an interrupt too, so it must not observe it.
        let detached = CancellationToken::new();
        let cancel = match phase {
            HookPhase::Setup => &self.cancel,
            HookPhase::Cleanup => &detached,
        };

        match self.run_foreground(command, env, true, cancel).await? {
            Foreground::Interrupted => Err(DocciError::SetupError(format!(
                "`{command}` was interrupted"
            ))),
            Foreground::Exited {
                success: true,
                env: next_env,
                output,
                ..
            } => {
                if !output.trim().is_empty() {
                    debug!(cmd = %command, ?phase, output = %output.trim_end(), "hook output");
                }
                Ok(next_env.unwrap_or_else(|| env.clone()))
            }
            Foreground::Exited { code, output, .. } => {
                let detail = output.trim_end();
                let detail = if detail.is_empty() {
                    format!("exited with status {}", code.unwrap_or(-1))
                } else {
                    detail.to_string()
                };
                Err(DocciError::SetupError(format!("`{command}` failed: {detail}")))
            }
        }
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("shell", &self.shell)
            .field("ignore_commands", &self.ignore_commands)
            .finish_non_exhaustive()
    }
}

impl BlockExecutor for CommandExecutor {
    fn run_block<'a>(
        &'a self,
        block: &'a CodeBlock,
        mode: ExecutionMode,
        env: &'a Environment,
    ) -> BoxFuture<'a, ExecutionOutcome> {
        Box::pin(self.execute_block(block, mode, env))
    }

    fn run_hook<'a>(
        &'a self,
        command: &'a str,
        phase: HookPhase,
        env: &'a Environment,
    ) -> BoxFuture<'a, Result<Environment>> {
        Box::pin(self.execute_hook(command, phase, env))
    }
}

/// True for lines whose first word keeps them in the foreground even in a
/// background block.
pub fn runs_in_foreground(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|word| FOREGROUND_COMMANDS.contains(&word))
}

/// Reads a pipe into a shared buffer so a partial read survives an abort.
struct PipeCollector {
    buf: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl PipeCollector {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let handle = pipe.map(|mut pipe| {
            let buf = Arc::clone(&buf);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(&chunk[..n]),
                    }
                }
            })
        });
        Self { buf, handle }
    }

    async fn finish(mut self) -> String {
        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(PIPE_DRAIN_GRACE, &mut handle).await.is_err() {
                debug!("pipe still open after exit; a child process holds it");
                handle.abort();
            }
        }
        let bytes = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn log_lines<R>(pipe: Option<R>, cmd: String)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(pipe) = pipe else {
        return;
    };
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!(cmd = %cmd, "background: {}", line),
                Ok(None) => break,
                Err(e) => {
                    warn!(cmd = %cmd, error = %e, "failed reading background output");
                    break;
                }
            }
        }
    });
}
