// src/config/validate.rs

use std::path::PathBuf;

use crate::config::model::{RawConfigFile, RunConfig};
use crate::errors::{DocciError, Result};
use crate::logging::parse_level_str;

impl TryFrom<RawConfigFile> for RunConfig {
    type Error = DocciError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let log_level = match raw.log_level.as_deref() {
            Some(level) => Some(parse_level_str(level).ok_or_else(|| {
                DocciError::ConfigError(format!(
                    "invalid log_level: {level} (expected error, warn, info, debug or trace)"
                ))
            })?),
            None => None,
        };

        Ok(RunConfig {
            paths: raw.paths,
            env_vars: raw.env_vars,
            pre_cmds: raw.pre_cmds,
            cleanup_cmds: raw.cleanup_cmds,
            working_dir: raw.working_dir.map(PathBuf::from),
            log_level,
            ignore_commands: raw.ignore_commands,
            followed_languages: raw.followed_languages,
            only_run_shell: raw.only_run_shell,
            supported_file_extensions: raw.supported_file_extensions,
            shell: raw.shell,
            failure_mode: raw.failure_mode,
        })
    }
}

/// Collect migration warnings for options that were renamed or removed.
pub fn legacy_option_warnings(raw: &RawConfigFile) -> Vec<String> {
    let mut options = Vec::new();

    if raw.debugging.is_some() {
        options.push("v0.6: `debugging` is now `log_level`".to_string());
    }

    options
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_paths(cfg)?;
    validate_languages(cfg)?;
    validate_execution(cfg)?;
    validate_working_dir(cfg)?;
    Ok(())
}

fn ensure_has_paths(cfg: &RawConfigFile) -> Result<()> {
    if cfg.paths.is_empty() {
        return Err(DocciError::ConfigError(
            "`paths` must list at least one file or directory".to_string(),
        ));
    }
    if let Some(blank) = cfg.paths.iter().position(|p| p.trim().is_empty()) {
        return Err(DocciError::ConfigError(format!(
            "`paths[{blank}]` is empty"
        )));
    }
    Ok(())
}

fn validate_languages(cfg: &RawConfigFile) -> Result<()> {
    if cfg.followed_languages.is_empty() {
        return Err(DocciError::ConfigError(
            "`followed_languages` must not be empty".to_string(),
        ));
    }
    if cfg.supported_file_extensions.is_empty() {
        return Err(DocciError::ConfigError(
            "`supported_file_extensions` must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_execution(cfg: &RawConfigFile) -> Result<()> {
    if cfg.shell.trim().is_empty() {
        return Err(DocciError::ConfigError("`shell` must not be empty".to_string()));
    }
    Ok(())
}

fn validate_working_dir(cfg: &RawConfigFile) -> Result<()> {
    if let Some(dir) = &cfg.working_dir {
        if !std::path::Path::new(dir).is_dir() {
            return Err(DocciError::ConfigError(format!(
                "`working_dir` {dir:?} is not an existing directory"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureMode;

    #[test]
    fn defaults_follow_shell_family() -> Result<()> {
        let cfg = RunConfig::try_from(RawConfigFile::with_paths(vec!["README.md".into()]))?;

        assert_eq!(cfg.followed_languages(), ["shell", "bash", "sh", "zsh", "ksh"]);
        assert!(cfg.only_run_shell());
        assert_eq!(cfg.supported_file_extensions(), ["md", "mdx"]);
        assert_eq!(cfg.shell(), "bash");
        assert_eq!(cfg.failure_mode(), FailureMode::FailFast);
        assert!(cfg.log_level().is_none());
        Ok(())
    }

    #[test]
    fn empty_paths_are_rejected() {
        let err = RunConfig::try_from(RawConfigFile::with_paths(vec![])).unwrap_err();
        assert!(matches!(err, DocciError::ConfigError(msg) if msg.contains("paths")));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut raw = RawConfigFile::with_paths(vec!["README.md".into()]);
        raw.log_level = Some("loud".into());
        let err = RunConfig::try_from(raw).unwrap_err();
        assert!(matches!(err, DocciError::ConfigError(msg) if msg.contains("loud")));
    }

    #[test]
    fn missing_working_dir_is_rejected() {
        let mut raw = RawConfigFile::with_paths(vec!["README.md".into()]);
        raw.working_dir = Some("/definitely/not/here".into());
        assert!(RunConfig::try_from(raw).is_err());
    }
}
