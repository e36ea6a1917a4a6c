// src/exec/directives.rs

//! Typed view of the annotations that steer execution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exec::env::Environment;
use crate::exec::outcome::SkipReason;
use crate::fs::FileSystem;
use crate::markdown::CodeBlock;
use crate::tags::Tag;

/// Default `docci-wait-for-endpoint` timeout.
pub const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(30);

/// Inclusive, 1-based line range of `docci-line-replace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointWait {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDirective {
    pub name: String,
    pub insert_at: Option<i64>,
    pub replace: Option<LineRange>,
    pub reset: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDirectives {
    pub background: bool,
    pub expect_failure: bool,
    pub output_contains: Option<String>,
    pub delay_after: Option<Duration>,
    pub delay_per_cmd: Option<Duration>,
    pub endpoint: Option<EndpointWait>,
    pub machine_os: Option<String>,
    pub if_not_installed: Option<String>,
    pub if_file_not_exists: Option<String>,
    pub file: Option<FileDirective>,
}

impl BlockDirectives {
    /// Read the directives of `block`; a malformed value is reported as a
    /// message naming the annotation.
    pub fn from_block(block: &CodeBlock) -> Result<Self, String> {
        let ann = block.annotations();

        if ann.has(Tag::FileName) && ann.value(Tag::FileName).is_none() {
            return Err(format!("{} needs a file name", Tag::FileName.canonical()));
        }

        let file = match ann.value(Tag::FileName) {
            Some(name) => Some(FileDirective {
                name: name.to_string(),
                insert_at: value_of(block, Tag::LineInsert, parse_line_number)?,
                replace: value_of(block, Tag::LineReplace, parse_line_range)?,
                reset: ann.has(Tag::ResetFile),
            }),
            None => None,
        };

        Ok(Self {
            background: ann.has(Tag::Background),
            expect_failure: ann.has(Tag::AssertFailure),
            output_contains: ann.value(Tag::OutputContains).map(str::to_string),
            delay_after: value_of(block, Tag::DelayAfter, parse_seconds)?,
            delay_per_cmd: value_of(block, Tag::DelayPerCmd, parse_seconds)?,
            endpoint: value_of(block, Tag::WaitForEndpoint, parse_endpoint)?,
            machine_os: ann.value(Tag::MachineOs).map(normalize_os),
            if_not_installed: ann.value(Tag::IfNotInstalled).map(str::to_string),
            if_file_not_exists: ann.value(Tag::IfFileNotExists).map(str::to_string),
            file,
        })
    }

    /// First guard that asks for this block to be skipped.
    pub fn skip_reason(
        &self,
        fs: &dyn FileSystem,
        env: &Environment,
        working_dir: Option<&Path>,
    ) -> Option<SkipReason> {
        if let Some(os) = &self.machine_os {
            if os != current_os() {
                return Some(SkipReason::OtherOs(os.clone()));
            }
        }

        if let Some(bin) = &self.if_not_installed {
            if binary_on_path(fs, env, bin) {
                return Some(SkipReason::AlreadyInstalled(bin.clone()));
            }
        }

        if let Some(path) = &self.if_file_not_exists {
            if fs.exists(&resolve_path(working_dir, path)) {
                return Some(SkipReason::FileExists(path.clone()));
            }
        }

        None
    }
}

fn value_of<T>(
    block: &CodeBlock,
    tag: Tag,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, String> {
    match block.annotations().value(tag) {
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| format!("invalid value for {}: {raw:?}", tag.canonical())),
        None => Ok(None),
    }
}

fn parse_seconds(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

fn parse_line_number(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// `N` or `N-M`.
fn parse_line_range(raw: &str) -> Option<LineRange> {
    let raw = raw.trim();
    match raw.split_once('-') {
        Some((start, end)) => {
            let start: usize = start.trim().parse().ok()?;
            let end: usize = end.trim().parse().ok()?;
            (start >= 1 && end >= start).then_some(LineRange {
                start,
                end: Some(end),
            })
        }
        None => {
            let start: usize = raw.parse().ok()?;
            (start >= 1).then_some(LineRange { start, end: None })
        }
    }
}

/// `url` or `url|timeout_secs`.
fn parse_endpoint(raw: &str) -> Option<EndpointWait> {
    let (url, timeout) = match raw.split_once('|') {
        Some((url, secs)) => (url, parse_seconds(secs)?),
        None => (raw, DEFAULT_ENDPOINT_TIMEOUT),
    };
    let url = url.trim();
    (!url.is_empty()).then(|| EndpointWait {
        url: url.to_string(),
        timeout,
    })
}

/// Map OS spellings onto the names used by `std::env::consts::OS`.
pub fn normalize_os(os: &str) -> String {
    let lower = os.trim().to_lowercase();
    match lower.as_str() {
        "ubuntu" | "debian" | "wsl" => "linux".to_string(),
        "mac" | "macos" | "darwin" | "osx" => "macos".to_string(),
        _ => lower,
    }
}

pub fn current_os() -> &'static str {
    std::env::consts::OS
}

fn binary_on_path(fs: &dyn FileSystem, env: &Environment, bin: &str) -> bool {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        return fs.is_executable(Path::new(bin));
    }
    let Some(path) = env.get("PATH") else {
        return false;
    };
    std::env::split_paths(path).any(|dir| fs.is_executable(&dir.join(bin)))
}

pub fn resolve_path(working_dir: Option<&Path>, path: &str) -> PathBuf {
    match working_dir {
        Some(dir) => dir.join(path),
        None => PathBuf::from(path),
    }
}
