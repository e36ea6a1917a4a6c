// src/markdown/mod.rs

//! Code block extraction.
//!
//! This module turns raw document text into an ordered list of
//! [`CodeBlock`]s. Nothing here executes anything:
//! - [`fence`] finds fenced regions and their bodies.
//! - [`annotations`] parses the `key` / `key=value` list on the fence line.

pub mod annotations;
pub mod fence;

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::tags::TagCatalog;

pub use annotations::{Annotation, Annotations};
pub use fence::{scan_fences, RawFence};

/// Language reported for fences that carry no language identifier.
pub const UNSPECIFIED_LANGUAGE: &str = "unspecified";

/// One fenced block of a document, with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    language: String,
    body: String,
    commands: Vec<String>,
    annotations: Annotations,
    source: PathBuf,
    index: usize,
    line: usize,
}

impl CodeBlock {
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The block body, verbatim.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Command lines to run, in order.
    ///
    /// For shell-family blocks comment lines and blank lines are dropped and
    /// backslash-continued lines are joined into one command.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// All command lines as one script, for session mode.
    pub fn script(&self) -> String {
        self.commands.join("\n")
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Zero-based position of this block within its document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based line of the opening fence.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Extract every fenced block of `content`, numbered in document order.
///
/// A document without fences yields an empty list.
pub fn extract_blocks(
    content: &str,
    source: &Path,
    catalog: &TagCatalog,
) -> Result<Vec<CodeBlock>> {
    scan_fences(content)
        .into_iter()
        .enumerate()
        .map(|(index, fence)| build_block(fence, index, source, catalog))
        .collect()
}

fn build_block(
    fence: RawFence,
    index: usize,
    source: &Path,
    catalog: &TagCatalog,
) -> Result<CodeBlock> {
    let (language, rest) = split_info(&fence.info);
    let annotations = Annotations::parse(rest, catalog)?;

    let commands = if catalog.is_shell_language(&language) {
        shell_commands(&fence.body)
    } else {
        fence.body.lines().map(str::to_string).collect()
    };

    Ok(CodeBlock {
        language,
        body: fence.body,
        commands,
        annotations,
        source: source.to_path_buf(),
        index,
        line: fence.line,
    })
}

/// Split an info string into the language and the annotation text.
fn split_info(info: &str) -> (String, &str) {
    if info.trim().is_empty() || info.starts_with(char::is_whitespace) {
        return (UNSPECIFIED_LANGUAGE.to_string(), info);
    }

    match info.find(char::is_whitespace) {
        Some(pos) => (info[..pos].to_string(), &info[pos..]),
        None => (info.to_string(), ""),
    }
}

fn shell_commands(body: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut pending: Option<String> = None;

    for raw in body.trim().lines() {
        let line = raw.trim();

        if let Some(mut command) = pending.take() {
            command.push('\n');
            command.push_str(line);
            if line.ends_with('\\') {
                pending = Some(command);
            } else {
                commands.push(command);
            }
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.ends_with('\\') {
            pending = Some(line.to_string());
        } else {
            commands.push(line.to_string());
        }
    }

    if let Some(command) = pending {
        commands.push(command);
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DocciError;
    use crate::tags::Tag;

    fn extract(doc: &str) -> Result<Vec<CodeBlock>> {
        extract_blocks(doc, Path::new("README.md"), &TagCatalog::builtin())
    }

    #[test]
    fn document_without_fences_yields_nothing() -> Result<()> {
        assert!(extract("# Title\n\nJust prose with `inline` code.\n")?.is_empty());
        assert!(extract("")?.is_empty());
        Ok(())
    }

    #[test]
    fn blocks_are_numbered_in_document_order() -> Result<()> {
        let doc = "```bash\necho a\n```\ntext\n```python\nprint(1)\n```\n```sh docci-ignore\nls\n```\n";
        let blocks = extract(doc)?;

        let summary: Vec<(usize, &str)> = blocks.iter().map(|b| (b.index(), b.language())).collect();
        assert_eq!(summary, vec![(0, "bash"), (1, "python"), (2, "sh")]);
        assert!(blocks[2].annotations().has(Tag::Ignore));
        assert_eq!(blocks[1].line(), 5);
        assert_eq!(blocks[0].source(), Path::new("README.md"));
        Ok(())
    }

    #[test]
    fn fence_without_language_is_unspecified() -> Result<()> {
        let blocks = extract("```\nplain\n```\n``` docci-bg\nx\n```\n")?;
        assert_eq!(blocks[0].language(), UNSPECIFIED_LANGUAGE);
        assert_eq!(blocks[1].language(), UNSPECIFIED_LANGUAGE);
        assert!(blocks[1].annotations().has(Tag::Background));
        Ok(())
    }

    #[test]
    fn shell_comments_and_blank_lines_are_not_commands() -> Result<()> {
        let doc = "```bash\n# Install\nmake setup\n\n# Build\nforge build\n```\n";
        let blocks = extract(doc)?;
        assert_eq!(blocks[0].commands(), ["make setup", "forge build"]);
        assert_eq!(blocks[0].script(), "make setup\nforge build");
        Ok(())
    }

    #[test]
    fn continued_lines_form_one_command() -> Result<()> {
        let doc = "```bash\ndocker run \\\n  -p 80:80 \\\n  nginx\necho done\n```\n";
        let blocks = extract(doc)?;
        assert_eq!(
            blocks[0].commands(),
            ["docker run \\\n-p 80:80 \\\nnginx", "echo done"]
        );
        Ok(())
    }

    #[test]
    fn non_shell_bodies_are_kept_verbatim() -> Result<()> {
        let doc = "```python docci-file=app.py\n# not a comment to strip\n\n    x = 1\n```\n";
        let blocks = extract(doc)?;
        assert_eq!(blocks[0].body(), "# not a comment to strip\n\n    x = 1");
        assert_eq!(blocks[0].annotations().value(Tag::FileName), Some("app.py"));
        Ok(())
    }

    #[test]
    fn quoted_annotation_values_survive_extraction() -> Result<()> {
        let doc = "```bash docci-output-contains=\"My Multi Word Value\"\npython3 example.py\n```";
        let blocks = extract(doc)?;
        assert_eq!(
            blocks[0].annotations().value(Tag::OutputContains),
            Some("My Multi Word Value")
        );
        Ok(())
    }

    #[test]
    fn invalid_tag_fails_extraction() {
        let err = extract("```bash docci-not-a-tag\nls\n```\n").unwrap_err();
        assert!(matches!(err, DocciError::InvalidTag(_)));
    }
}
