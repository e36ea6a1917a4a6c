// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawConfigFile, RunConfig};
use crate::config::validate::legacy_option_warnings;
use crate::errors::{DocciError, Result};

/// File looked up when the configuration input names a directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// A validated configuration plus the migration warnings found while
/// loading it.
///
/// Warnings are returned rather than logged because logging is only set up
/// once the configured level is known.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RunConfig,
    pub warnings: Vec<String>,
}

/// Load and validate the configuration named by `input`.
///
/// - A directory means `<dir>/config.json`.
/// - A file is parsed as TOML when it ends in `.toml`, as JSON otherwise.
/// - Anything else is parsed as an inline JSON document.
pub fn load_configuration(input: &str) -> Result<LoadedConfig> {
    let raw = load_raw(input)?;
    let warnings = legacy_option_warnings(&raw);
    let config = RunConfig::try_from(raw)?;
    Ok(LoadedConfig { config, warnings })
}

/// Read and deserialize without semantic validation.
pub fn load_raw(input: &str) -> Result<RawConfigFile> {
    let path = Path::new(input);

    if path.is_dir() {
        let file = default_config_path(path);
        if !file.is_file() {
            return Err(DocciError::ConfigError(format!(
                "directory {} has no {DEFAULT_CONFIG_FILE}",
                path.display()
            )));
        }
        return load_from_path(file);
    }

    if path.is_file() {
        return load_from_path(path);
    }

    serde_json::from_str(input).map_err(|e| {
        DocciError::ConfigError(format!(
            "{input:?} is neither a file, a directory nor valid JSON: {e}"
        ))
    })
}

/// Read one configuration file, choosing the format from its extension.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config = if is_toml(path) {
        toml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };

    Ok(config)
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// `config.json` inside `dir`.
pub fn default_config_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(DEFAULT_CONFIG_FILE)
}
