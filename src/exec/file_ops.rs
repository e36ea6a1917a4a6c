// src/exec/file_ops.rs

//! `docci-file` and its line operations.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::exec::directives::{resolve_path, FileDirective, LineRange};
use crate::fs::FileSystem;

/// Apply `directive` with `body` as the content; returns the written path.
///
/// - missing target or `docci-reset-file`: the file becomes `body`;
/// - `docci-line-insert=N`: `body` goes after line N (negative N counts from
///   the end, `-1` appends);
/// - `docci-line-replace=N` / `N-M`: lines N..=M are replaced by `body`;
/// - an existing file without reset or a line operation is left untouched.
pub fn apply_file_directive(
    fs: &dyn FileSystem,
    directive: &FileDirective,
    body: &str,
    working_dir: Option<&Path>,
) -> Result<PathBuf> {
    let path = resolve_path(working_dir, &directive.name);
    let mut content = body.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }

    let has_line_op = directive.insert_at.is_some() || directive.replace.is_some();

    if directive.reset || !fs.exists(&path) {
        debug!(file = %path.display(), reset = directive.reset, "writing file");
        fs.write(&path, content.as_bytes())?;
        return Ok(path);
    }

    if !has_line_op {
        debug!(file = %path.display(), "file exists; nothing to do");
        return Ok(path);
    }

    let existing = fs.read_to_string(&path)?;
    let mut lines: Vec<String> = existing.split_inclusive('\n').map(str::to_string).collect();
    if let Some(last) = lines.last_mut() {
        if !last.ends_with('\n') {
            last.push('\n');
        }
    }

    if let Some(at) = directive.insert_at {
        insert_lines(&mut lines, at, &content);
    }
    if let Some(range) = directive.replace {
        replace_lines(&mut lines, range, &content);
    }

    debug!(file = %path.display(), "updated file lines");
    fs.write(&path, lines.concat().as_bytes())?;
    Ok(path)
}

fn insert_lines(lines: &mut Vec<String>, at: i64, content: &str) {
    let len = lines.len() as i64;
    let index = if at >= 0 { at } else { len + at + 1 };
    let index = index.clamp(0, len) as usize;
    lines.insert(index, content.to_string());
}

fn replace_lines(lines: &mut Vec<String>, range: LineRange, content: &str) {
    let start = range.start - 1;
    if start >= lines.len() {
        lines.push(content.to_string());
        return;
    }
    let end = range.end.unwrap_or(range.start).min(lines.len());
    lines.splice(start..end, [content.to_string()]);
}
