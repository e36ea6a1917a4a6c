// src/markdown/fence.rs

//! Fenced region scanning.
//!
//! A fence opens on a line whose first non-blank characters are three or
//! more backticks and whose remaining text (the info string) contains no
//! backtick. It closes on a line holding only backticks, at least as many
//! as the opening run. A fence left open runs to the end of the document.

/// A fenced region before its info string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFence {
    /// Everything after the opening backticks on the fence line.
    pub info: String,
    pub body: String,
    /// 1-based line of the opening fence.
    pub line: usize,
    pub closed: bool,
}

struct OpenFence {
    indent: usize,
    ticks: usize,
    info: String,
    line: usize,
    body: Vec<String>,
}

impl OpenFence {
    fn finish(self, closed: bool) -> RawFence {
        RawFence {
            info: self.info,
            body: self.body.join("\n"),
            line: self.line,
            closed,
        }
    }
}

/// Find every fenced region in document order.
pub fn scan_fences(content: &str) -> Vec<RawFence> {
    let mut fences = Vec::new();
    let mut open: Option<OpenFence> = None;

    for (idx, line) in content.lines().enumerate() {
        let closing = matches!(&open, Some(fence) if is_closing(line, fence.ticks));

        if closing {
            if let Some(fence) = open.take() {
                fences.push(fence.finish(true));
            }
            continue;
        }

        match open.as_mut() {
            Some(fence) => {
                let stripped = strip_indent(line, fence.indent);
                fence.body.push(stripped.to_string());
            }
            None => {
                if let Some((indent, ticks, info)) = parse_opening(line) {
                    open = Some(OpenFence {
                        indent,
                        ticks,
                        info: info.to_string(),
                        line: idx + 1,
                        body: Vec::new(),
                    });
                }
            }
        }
    }

    if let Some(fence) = open {
        fences.push(fence.finish(false));
    }

    fences
}

/// Returns `(indent, backtick count, info string)` for an opening fence.
fn parse_opening(line: &str) -> Option<(usize, usize, &str)> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let indent = line.len() - trimmed.len();
    let ticks = trimmed.chars().take_while(|&c| c == '`').count();

    if ticks < 3 {
        return None;
    }

    let info = &trimmed[ticks..];
    if info.contains('`') {
        // Inline code such as ```foo``` on a single line.
        return None;
    }

    Some((indent, ticks, info))
}

fn is_closing(line: &str, opening_ticks: usize) -> bool {
    let trimmed = line.trim();
    let ticks = trimmed.chars().take_while(|&c| c == '`').count();
    ticks >= opening_ticks && ticks == trimmed.len()
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let removable = line
        .chars()
        .take(indent)
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();
    &line[removable..]
}
