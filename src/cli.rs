// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `docci`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "docci",
    version,
    about = "Run the code blocks of your documentation as tests.",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration: a JSON/TOML file, a directory holding `config.json`,
    /// or an inline JSON document.
    #[arg(value_name = "CONFIG", required_unless_present = "tags")]
    pub config: Option<String>,

    /// Print every supported tag and its aliases, then exit.
    #[arg(long)]
    pub tags: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, the configured `log_level`, `DOCCI_LOG` or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load the configuration and list the blocks that would run, without
    /// executing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_optional_with_tags() {
        let args = CliArgs::try_parse_from(["docci", "--tags"]).unwrap();
        assert!(args.tags);
        assert!(args.config.is_none());
    }

    #[test]
    fn config_is_required_otherwise() {
        assert!(CliArgs::try_parse_from(["docci"]).is_err());

        let args =
            CliArgs::try_parse_from(["docci", "docs/config.json", "--log-level", "debug"]).unwrap();
        assert_eq!(args.config.as_deref(), Some("docs/config.json"));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
    }
}
