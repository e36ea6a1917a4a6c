// src/exec/env.rs

//! The environment handed to every spawned command.
//!
//! The process's own environment is never mutated. Instead an explicit
//! [`Environment`] is built once during setup and passed to each child with
//! `env_clear().envs(..)`.

use std::collections::BTreeMap;

/// Variables the shell maintains itself; never carried between commands.
const SHELL_MANAGED: [&str; 4] = ["_", "SHLVL", "PWD", "OLDPWD"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Overlay `vars` on top of the current values.
    pub fn extend<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.set(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Parse the NUL separated `KEY=VALUE` records written by `env -0`.
    ///
    /// Shell-managed variables and any name in `exclude` are dropped.
    pub fn from_env_dump(dump: &[u8], exclude: &[&str]) -> Self {
        let mut vars = BTreeMap::new();

        for record in dump.split(|b| *b == 0) {
            if record.is_empty() {
                continue;
            }
            let record = String::from_utf8_lossy(record);
            let Some((key, value)) = record.split_once('=') else {
                continue;
            };
            if key.is_empty() || SHELL_MANAGED.contains(&key) || exclude.contains(&key) {
                continue;
            }
            vars.insert(key.to_string(), value.to_string());
        }

        Self { vars }
    }
}
