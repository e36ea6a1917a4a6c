use std::str::FromStr;

use serde::Deserialize;

/// What the run does after a block fails.
///
/// - `FailFast`: stop at the first failing block (default).
/// - `CollectPerFile`: keep running the remaining blocks of the file that
///   failed, report every failure from that file, then stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    #[default]
    FailFast,
    CollectPerFile,
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail_fast" => Ok(FailureMode::FailFast),
            "collect_per_file" => Ok(FailureMode::CollectPerFile),
            other => Err(format!(
                "invalid failure_mode: {other} (expected \"fail_fast\" or \"collect_per_file\")"
            )),
        }
    }
}

/// How the commands of an eligible block are handed to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One shell invocation per command line.
    LineByLine,
    /// The whole block is a single script run by one shell.
    Session,
}
