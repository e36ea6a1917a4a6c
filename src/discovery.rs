// src/discovery.rs

//! Resolve configured content paths into concrete documentation files.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Files discovered from one configured path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    /// The configured path, verbatim.
    pub key: String,
    /// Sorted documentation files.
    pub files: Vec<PathBuf>,
}

/// Build one group per configured path, in configuration order.
///
/// - A directory is walked recursively, keeping files whose extension is in
///   `extensions` (compared case-insensitively, leading dots ignored).
/// - Anything else is taken as a single file, even if it does not exist; the
///   orchestrator reports the read failure for that group later.
/// - A path listed twice maps onto its first group.
pub fn discover_groups(
    fs: &dyn FileSystem,
    paths: &[String],
    extensions: &[String],
) -> Vec<FileGroup> {
    let mut groups: Vec<FileGroup> = Vec::new();

    for key in paths {
        if groups.iter().any(|g| &g.key == key) {
            debug!(path = %key, "path listed more than once; keeping first occurrence");
            continue;
        }

        let path = Path::new(key);
        let mut files = if fs.is_dir(path) {
            let mut found = Vec::new();
            walk(fs, path, extensions, &mut found);
            found
        } else {
            vec![path.to_path_buf()]
        };
        files.sort();

        debug!(path = %key, count = files.len(), "discovered documentation files");
        groups.push(FileGroup {
            key: key.clone(),
            files,
        });
    }

    groups
}

fn walk(fs: &dyn FileSystem, dir: &Path, extensions: &[String], found: &mut Vec<PathBuf>) {
    let entries = match fs.list_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries {
        if fs.is_dir(&entry) {
            walk(fs, &entry, extensions, found);
        } else if has_supported_extension(&entry, extensions) {
            found.push(entry);
        }
    }
}

pub fn has_supported_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
