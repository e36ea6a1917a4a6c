// src/exec/outcome.rs

use std::fmt;

/// Why a block was skipped without running anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Language not followed, or not shell while only shell runs.
    Language(String),
    /// Carries `docci-ignore`.
    Annotated,
    /// `docci-os` names another operating system.
    OtherOs(String),
    /// `docci-if-not-installed` binary already on PATH.
    AlreadyInstalled(String),
    /// `docci-if-file-not-exists` path already present.
    FileExists(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Language(lang) => write!(f, "language `{lang}` is not followed"),
            SkipReason::Annotated => write!(f, "marked docci-ignore"),
            SkipReason::OtherOs(os) => write!(f, "only runs on {os}"),
            SkipReason::AlreadyInstalled(bin) => write!(f, "`{bin}` is already installed"),
            SkipReason::FileExists(path) => write!(f, "`{path}` already exists"),
        }
    }
}

/// Result of running (or not running) one block.
///
/// Failure variants always carry a non-empty diagnostic; use the
/// constructors to build them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success {
        output: String,
    },
    Skipped {
        output: String,
        reason: SkipReason,
    },
    AssertionFailed {
        diagnostic: String,
        command: String,
    },
    CommandFailed {
        diagnostic: String,
        command: String,
    },
    Interrupted {
        diagnostic: String,
        command: String,
    },
}

fn non_empty(diagnostic: String, fallback: impl FnOnce() -> String) -> String {
    if diagnostic.trim().is_empty() {
        fallback()
    } else {
        diagnostic
    }
}

impl ExecutionOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        ExecutionOutcome::Success {
            output: output.into(),
        }
    }

    pub fn skipped(reason: SkipReason) -> Self {
        ExecutionOutcome::Skipped {
            output: String::new(),
            reason,
        }
    }

    /// `` `<needle>` is not found in output ``.
    pub fn missing_output(needle: &str, command: impl Into<String>) -> Self {
        ExecutionOutcome::AssertionFailed {
            diagnostic: format!("`{needle}` is not found in output"),
            command: command.into(),
        }
    }

    pub fn command_failed(diagnostic: impl Into<String>, command: impl Into<String>) -> Self {
        let command = command.into();
        let diagnostic = non_empty(diagnostic.into(), || format!("`{command}` failed"));
        ExecutionOutcome::CommandFailed {
            diagnostic,
            command,
        }
    }

    /// Non-zero exit; the captured text is the diagnostic when there is any.
    pub fn exit_failure(output: &str, code: Option<i32>, command: impl Into<String>) -> Self {
        let command = command.into();
        let diagnostic = non_empty(output.trim_end().to_string(), || match code {
            Some(code) => format!("`{command}` exited with status {code}"),
            None => format!("`{command}` was terminated by a signal"),
        });
        ExecutionOutcome::CommandFailed {
            diagnostic,
            command,
        }
    }

    pub fn interrupted(command: impl Into<String>) -> Self {
        ExecutionOutcome::Interrupted {
            diagnostic: "Interrupted by user".to_string(),
            command: command.into(),
        }
    }

    /// AssertionFailed or CommandFailed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ExecutionOutcome::AssertionFailed { .. } | ExecutionOutcome::CommandFailed { .. }
        )
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, ExecutionOutcome::Interrupted { .. })
    }

    /// Captured output of a Success or Skipped outcome.
    pub fn output(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Success { output } | ExecutionOutcome::Skipped { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::AssertionFailed { diagnostic, .. }
            | ExecutionOutcome::CommandFailed { diagnostic, .. }
            | ExecutionOutcome::Interrupted { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::AssertionFailed { command, .. }
            | ExecutionOutcome::CommandFailed { command, .. }
            | ExecutionOutcome::Interrupted { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success { .. } => "success",
            ExecutionOutcome::Skipped { .. } => "skipped",
            ExecutionOutcome::AssertionFailed { .. } => "assertion_failed",
            ExecutionOutcome::CommandFailed { .. } => "command_failed",
            ExecutionOutcome::Interrupted { .. } => "interrupted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_never_have_empty_diagnostics() {
        let out = ExecutionOutcome::exit_failure("  \n", Some(3), "false");
        assert_eq!(out.diagnostic(), Some("`false` exited with status 3"));

        let out = ExecutionOutcome::command_failed("", "x");
        assert_eq!(out.diagnostic(), Some("`x` failed"));

        let out = ExecutionOutcome::exit_failure("boom\n", Some(1), "x");
        assert_eq!(out.diagnostic(), Some("boom"));
    }

    #[test]
    fn missing_output_diagnostic_is_exact() {
        let out = ExecutionOutcome::missing_output("FOO", "echo bar");
        assert_eq!(out.diagnostic(), Some("`FOO` is not found in output"));
        assert!(out.is_failure());
        assert!(!ExecutionOutcome::interrupted("x").is_failure());
    }
}
