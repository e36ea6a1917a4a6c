#![allow(dead_code)]

use std::fs;

pub use docci_test_utils::builders::RunConfigBuilder;
pub use docci_test_utils::fake_executor::{FakeCall, FakeExecutor};
pub use docci_test_utils::{init_tracing, with_timeout};

/// Write `files` (relative path, contents) under a fresh temp dir.
pub fn doc_tree(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write doc file");
    }
    dir
}
