// src/errors.rs

//! Library error type.
//!
//! Block failures are not errors: they are outcomes collected by the
//! engine (see `engine::RunError`). `DocciError` covers what prevents a run
//! from being set up or a document from being understood.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocciError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A `pre_cmds` (or `cleanup_cmds`) entry failed.
    #[error("Setup error: {0}")]
    SetupError(String),

    #[error("Invalid tag found in your documentation: {0}. Check the release notes for renamed tags")]
    InvalidTag(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DocciError>;
