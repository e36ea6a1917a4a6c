// src/logging.rs

//! `tracing` subscriber setup.
//!
//! The effective level is the first of: the `--log-level` flag, the
//! configured `log_level`, `$DOCCI_LOG`, then `info`. Everything is written
//! to STDERR; STDOUT only carries the output collected from blocks.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "DOCCI_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(level: Level) -> Result<()> {
    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

pub fn resolve_level(cli_level: Option<LogLevel>, configured: Option<Level>) -> Level {
    if let Some(level) = cli_level {
        return level.into();
    }
    configured
        .or_else(|| env_level(std::env::var(LOG_ENV_VAR).ok().as_deref()))
        .unwrap_or(Level::INFO)
}

fn env_level(value: Option<&str>) -> Option<Level> {
    value.and_then(parse_level_str)
}

/// Parse a level name case-insensitively; `warning` is accepted for `warn`.
pub fn parse_level_str(s: &str) -> Option<Level> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    // `Level::from_str` also accepts the numeric forms 1..=5.
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level_str("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level_str(" warning "), Some(Level::WARN));
        assert_eq!(parse_level_str("Trace"), Some(Level::TRACE));
        assert_eq!(parse_level_str("verbose"), None);
    }

    #[test]
    fn cli_flag_beats_configured_level() {
        assert_eq!(resolve_level(Some(LogLevel::Trace), Some(Level::ERROR)), Level::TRACE);
        assert_eq!(resolve_level(None, Some(Level::ERROR)), Level::ERROR);
    }

    #[test]
    fn unparseable_env_value_is_ignored() {
        assert_eq!(env_level(Some("loud")), None);
        assert_eq!(env_level(Some("warn")), Some(Level::WARN));
        assert_eq!(env_level(None), None);
    }
}
