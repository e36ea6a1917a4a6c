#![allow(dead_code)]

use std::path::Path;

use docci::config::{RawConfigFile, RunConfig};
use docci::types::FailureMode;

/// Builder for `RunConfig` to simplify test setup.
pub struct RunConfigBuilder {
    config: RawConfigFile,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::with_paths(Vec::new()),
        }
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config
            .paths
            .push(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn env_var(mut self, key: &str, value: &str) -> Self {
        self.config.env_vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn pre_cmd(mut self, cmd: &str) -> Self {
        self.config.pre_cmds.push(cmd.to_string());
        self
    }

    pub fn cleanup_cmd(mut self, cmd: &str) -> Self {
        self.config.cleanup_cmds.push(cmd.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.working_dir = Some(dir.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn ignore_command(mut self, pattern: &str) -> Self {
        self.config.ignore_commands.push(pattern.to_string());
        self
    }

    pub fn languages(mut self, languages: &[&str]) -> Self {
        self.config.followed_languages = languages.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn only_run_shell(mut self, val: bool) -> Self {
        self.config.only_run_shell = val;
        self
    }

    pub fn failure_mode(mut self, mode: FailureMode) -> Self {
        self.config.failure_mode = mode;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> RunConfig {
        RunConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
