// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::tags::SHELL_LANGUAGES;
use crate::types::FailureMode;

/// Configuration document as read from JSON (or TOML).
///
/// ```json
/// {
///   "paths": ["README.md", "docs/"],
///   "env_vars": { "GREETING": "hello" },
///   "pre_cmds": ["make build"],
///   "cleanup_cmds": ["make clean"],
///   "working_dir": "examples",
///   "log_level": "debug"
/// }
/// ```
///
/// Only `paths` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Files or directories holding the documentation to run.
    pub paths: Vec<String>,

    /// Added to the environment of every command.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,

    /// Run once before any block; variables they export persist for the run.
    #[serde(default)]
    pub pre_cmds: Vec<String>,

    /// Run once after everything else, whatever the outcome.
    #[serde(default)]
    pub cleanup_cmds: Vec<String>,

    #[serde(default)]
    pub working_dir: Option<String>,

    #[serde(default)]
    pub log_level: Option<String>,

    /// Command lines containing any of these substrings are not run.
    #[serde(default)]
    pub ignore_commands: Vec<String>,

    #[serde(default = "default_followed_languages")]
    pub followed_languages: Vec<String>,

    /// Restrict execution to shell-family languages.
    #[serde(default = "default_only_run_shell", alias = "only_run_bash")]
    pub only_run_shell: bool,

    #[serde(default = "default_supported_file_extensions")]
    pub supported_file_extensions: Vec<String>,

    /// Program used as `<shell> -c <script>`.
    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default)]
    pub failure_mode: FailureMode,

    /// Renamed to `log_level`; only detected to warn about it.
    #[serde(default)]
    pub debugging: Option<IgnoredAny>,
}

fn default_followed_languages() -> Vec<String> {
    SHELL_LANGUAGES.iter().map(|s| s.to_string()).collect()
}

fn default_only_run_shell() -> bool {
    true
}

fn default_supported_file_extensions() -> Vec<String> {
    vec!["md".to_string(), "mdx".to_string()]
}

fn default_shell() -> String {
    "bash".to_string()
}

impl RawConfigFile {
    /// A document with the given paths and every other key at its default.
    pub fn with_paths(paths: Vec<String>) -> Self {
        Self {
            paths,
            env_vars: BTreeMap::new(),
            pre_cmds: Vec::new(),
            cleanup_cmds: Vec::new(),
            working_dir: None,
            log_level: None,
            ignore_commands: Vec::new(),
            followed_languages: default_followed_languages(),
            only_run_shell: default_only_run_shell(),
            supported_file_extensions: default_supported_file_extensions(),
            shell: default_shell(),
            failure_mode: FailureMode::default(),
            debugging: None,
        }
    }
}

/// Validated, immutable run configuration.
///
/// Built through `RunConfig::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub(crate) paths: Vec<String>,
    pub(crate) env_vars: BTreeMap<String, String>,
    pub(crate) pre_cmds: Vec<String>,
    pub(crate) cleanup_cmds: Vec<String>,
    pub(crate) working_dir: Option<PathBuf>,
    pub(crate) log_level: Option<tracing::Level>,
    pub(crate) ignore_commands: Vec<String>,
    pub(crate) followed_languages: Vec<String>,
    pub(crate) only_run_shell: bool,
    pub(crate) supported_file_extensions: Vec<String>,
    pub(crate) shell: String,
    pub(crate) failure_mode: FailureMode,
}

impl RunConfig {
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    pub fn pre_cmds(&self) -> &[String] {
        &self.pre_cmds
    }

    pub fn cleanup_cmds(&self) -> &[String] {
        &self.cleanup_cmds
    }

    pub fn working_dir(&self) -> Option<&std::path::Path> {
        self.working_dir.as_deref()
    }

    pub fn log_level(&self) -> Option<tracing::Level> {
        self.log_level
    }

    pub fn ignore_commands(&self) -> &[String] {
        &self.ignore_commands
    }

    pub fn followed_languages(&self) -> &[String] {
        &self.followed_languages
    }

    pub fn only_run_shell(&self) -> bool {
        self.only_run_shell
    }

    pub fn supported_file_extensions(&self) -> &[String] {
        &self.supported_file_extensions
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }
}
