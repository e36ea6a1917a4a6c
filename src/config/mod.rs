// src/config/mod.rs

//! Configuration loading and validation for docci.
//!
//! Responsibilities:
//! - Define the JSON/TOML-backed data model (`model.rs`).
//! - Load a config from a file, a directory or an inline document (`loader.rs`).
//! - Validate invariants and collect legacy-option warnings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_configuration, load_from_path, LoadedConfig};
pub use model::{RawConfigFile, RunConfig};
pub use validate::legacy_option_warnings;
