// src/exec/shell.rs

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::exec::env::Environment;

/// Variable naming the file the exit trap dumps the environment into.
pub const ENV_DUMP_VAR: &str = "__DOCCI_ENV_DUMP";

/// Shell program and working directory shared by every spawn.
#[derive(Debug, Clone)]
pub struct ShellSpec {
    pub program: String,
    pub working_dir: Option<PathBuf>,
}

impl ShellSpec {
    pub fn new(program: impl Into<String>, working_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir,
        }
    }

    /// `<program> -c <script>` with exactly `env` as its environment.
    ///
    /// On unix the child leads a new process group so the whole tree can be
    /// signalled at once.
    pub fn command(&self, script: &str, env: &Environment) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c")
            .arg(script)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null());

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}

/// Wrap `script` so that stderr is merged into stdout and the final
/// environment is written to `$__DOCCI_ENV_DUMP` when the shell exits.
///
/// `set -a` exports plain `NAME=value` assignments so they land in the dump
/// too. `strict` adds `set -e`, making a multi-line script stop at its first
/// failing command.
pub fn capture_script(script: &str, strict: bool) -> String {
    let mut wrapped = String::from("exec 2>&1\n");
    wrapped.push_str(&format!("trap 'env -0 > \"${ENV_DUMP_VAR}\"' EXIT\n"));
    wrapped.push_str("set -a\n");
    if strict {
        wrapped.push_str("set -e\n");
    }
    wrapped.push_str(script);
    wrapped
}
