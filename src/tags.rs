// src/tags.rs

//! Annotation tags and language aliases.
//!
//! Every execution modifier is a `docci-` prefixed annotation on a fence's
//! opening line. [`TagCatalog`] maps canonical names and their aliases onto
//! [`Tag`] values and also owns the language alias table consulted by the
//! block filter. The catalog is built once and only read afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Prefix shared by every annotation with a meaning.
pub const TAG_PREFIX: &str = "docci-";

/// The shell-family languages.
pub const SHELL_LANGUAGES: [&str; 5] = ["shell", "bash", "sh", "zsh", "ksh"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Ignore,
    Background,
    DelayAfter,
    DelayPerCmd,
    WaitForEndpoint,
    IfNotInstalled,
    OutputContains,
    AssertFailure,
    MachineOs,
    IfFileNotExists,
    FileName,
    LineInsert,
    LineReplace,
    ResetFile,
    Session,
}

impl Tag {
    pub const ALL: [Tag; 15] = [
        Tag::Ignore,
        Tag::Background,
        Tag::DelayAfter,
        Tag::DelayPerCmd,
        Tag::WaitForEndpoint,
        Tag::IfNotInstalled,
        Tag::OutputContains,
        Tag::AssertFailure,
        Tag::MachineOs,
        Tag::IfFileNotExists,
        Tag::FileName,
        Tag::LineInsert,
        Tag::LineReplace,
        Tag::ResetFile,
        Tag::Session,
    ];

    pub fn canonical(self) -> &'static str {
        match self {
            Tag::Ignore => "docci-ignore",
            Tag::Background => "docci-background",
            Tag::DelayAfter => "docci-delay-after",
            Tag::DelayPerCmd => "docci-delay-per-cmd",
            Tag::WaitForEndpoint => "docci-wait-for-endpoint",
            Tag::IfNotInstalled => "docci-if-not-installed",
            Tag::OutputContains => "docci-output-contains",
            Tag::AssertFailure => "docci-assert-failure",
            Tag::MachineOs => "docci-os",
            Tag::IfFileNotExists => "docci-if-file-not-exists",
            Tag::FileName => "docci-file",
            Tag::LineInsert => "docci-line-insert",
            Tag::LineReplace => "docci-line-replace",
            Tag::ResetFile => "docci-reset-file",
            Tag::Session => "docci-session",
        }
    }

    fn builtin_aliases(self) -> &'static [&'static str] {
        match self {
            Tag::Ignore => &["docci-skip"],
            Tag::Background => &["docci-bg"],
            Tag::DelayAfter => &["docci-after-delay"],
            Tag::DelayPerCmd => &["docci-cmd-delay"],
            Tag::OutputContains => &[
                "docci-contains-output",
                "docci-expected-output",
                "docci-contains",
            ],
            Tag::AssertFailure => &["docci-expect-failure", "docci-should-fail"],
            Tag::MachineOs => &["docci-machine"],
            Tag::FileName => &["docci-file-name"],
            Tag::LineInsert => &["docci-insert-at-line", "docci-insert-line"],
            Tag::LineReplace => &["docci-replace-at-line", "docci-replace-line"],
            Tag::Session => &["docci-script"],
            Tag::WaitForEndpoint
            | Tag::IfNotInstalled
            | Tag::IfFileNotExists
            | Tag::ResetFile => &[],
        }
    }
}

/// Immutable lookup table for tags and languages.
#[derive(Debug, Clone)]
pub struct TagCatalog {
    /// Canonical name -> aliases, sorted by canonical name.
    tags: BTreeMap<&'static str, (Tag, Vec<&'static str>)>,
    /// Every accepted spelling (canonical and alias) -> tag.
    by_name: HashMap<&'static str, Tag>,
    /// Language alias (lowercase) -> canonical language.
    languages: HashMap<&'static str, &'static str>,
}

impl TagCatalog {
    pub fn builtin() -> Self {
        let mut tags = BTreeMap::new();
        let mut by_name = HashMap::new();

        for tag in Tag::ALL {
            let aliases = tag.builtin_aliases().to_vec();
            by_name.insert(tag.canonical(), tag);
            for alias in &aliases {
                by_name.insert(*alias, tag);
            }
            tags.insert(tag.canonical(), (tag, aliases));
        }

        let language_aliases: [(&'static str, &[&'static str]); 5] = [
            ("shell", &["shellscript", "shell-script", "console"]),
            ("bash", &["bash-script"]),
            ("sh", &["posix"]),
            ("zsh", &[]),
            ("ksh", &[]),
        ];

        let mut languages = HashMap::new();
        for (canonical, aliases) in language_aliases {
            languages.insert(canonical, canonical);
            for alias in aliases {
                languages.insert(*alias, canonical);
            }
        }

        Self {
            tags,
            by_name,
            languages,
        }
    }

    /// Resolve a canonical tag name or one of its aliases.
    pub fn resolve(&self, name: &str) -> Option<Tag> {
        self.by_name.get(name).copied()
    }

    pub fn aliases(&self, tag: Tag) -> &[&'static str] {
        self.tags
            .get(tag.canonical())
            .map(|(_, aliases)| aliases.as_slice())
            .unwrap_or(&[])
    }

    /// Canonical name of a registered language, matched case-insensitively.
    pub fn resolve_language(&self, language: &str) -> Option<&'static str> {
        let lower = language.to_ascii_lowercase();
        self.languages.get(lower.as_str()).copied()
    }

    pub fn is_shell_language(&self, language: &str) -> bool {
        let lower = language.to_ascii_lowercase();
        let canonical = self
            .resolve_language(&lower)
            .unwrap_or(lower.as_str());
        SHELL_LANGUAGES.contains(&canonical)
    }

    /// The `--tags` listing: one tag per line, sorted by canonical name.
    pub fn render_listing(&self) -> String {
        let mut out = String::new();
        for (canonical, (_, aliases)) in &self.tags {
            if aliases.is_empty() {
                let _ = writeln!(out, "- {canonical}");
            } else {
                let _ = writeln!(out, "- {canonical} (aliases: {})", aliases.join(", "));
            }
        }
        out
    }
}

impl Default for TagCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_tag() {
        let catalog = TagCatalog::builtin();
        assert_eq!(catalog.resolve("docci-should-fail"), Some(Tag::AssertFailure));
        assert_eq!(catalog.resolve("docci-contains"), Some(Tag::OutputContains));
        assert_eq!(catalog.resolve("docci-ignore"), Some(Tag::Ignore));
        assert_eq!(catalog.resolve("docci-nope"), None);
    }

    #[test]
    fn listing_is_sorted_by_canonical_name() {
        let listing = TagCatalog::builtin().render_listing();
        let names: Vec<&str> = listing
            .lines()
            .map(|l| l.trim_start_matches("- ").split(' ').next().unwrap_or(""))
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), Tag::ALL.len());
        assert!(!listing.contains("- docci-bg"));
        assert!(listing.contains("- docci-background (aliases: docci-bg)"));
        assert!(listing.contains("- docci-reset-file\n"));
    }

    #[test]
    fn shell_languages_match_through_aliases() {
        let catalog = TagCatalog::builtin();
        assert!(catalog.is_shell_language("BASH"));
        assert!(catalog.is_shell_language("shellscript"));
        assert!(!catalog.is_shell_language("python"));
        assert_eq!(catalog.resolve_language("Console"), Some("shell"));
    }
}
