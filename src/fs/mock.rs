// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};

use super::FileSystem;

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl Tree {
    /// Register every ancestor of `path` as a directory.
    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// In-memory filesystem for tests. Clones share the same tree and every
/// file counts as executable.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    tree: Arc<Mutex<Tree>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut tree = self.lock();
        tree.add_ancestors(path);
        tree.files.insert(path.to_path_buf(), content.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut tree = self.lock();
        tree.add_ancestors(path);
        tree.dirs.insert(path.to_path_buf());
    }

    /// Current contents of a file, if it exists and is valid UTF-8.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let tree = self.lock();
        let bytes = tree.files.get(path.as_ref())?;
        String::from_utf8(bytes.clone()).ok()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let tree = self.lock();
        match tree.files.get(path) {
            Some(bytes) => String::from_utf8(bytes.clone())
                .map_err(|e| anyhow!("{} is not valid UTF-8: {e}", path.display())),
            None if tree.dirs.contains(path) => Err(anyhow!("{} is a directory", path.display())),
            None => Err(anyhow!("File not found: {}", path.display())),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.lock();
        tree.files.contains_key(path) || tree.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock().dirs.contains(path)
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let tree = self.lock();
        if !tree.dirs.contains(dir) {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }

        let mut entries: Vec<PathBuf> = tree
            .files
            .keys()
            .chain(tree.dirs.iter())
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        entries.sort();
        Ok(entries)
    }
}
