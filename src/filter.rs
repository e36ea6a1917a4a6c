// src/filter.rs

//! Block eligibility.
//!
//! A block runs when its language is followed, it is not marked
//! `docci-ignore`, and (with `only_run_shell`) its language belongs to the
//! shell family. Languages are compared case-insensitively after resolving
//! registered aliases on both sides. `docci-file` blocks only write a file
//! and are eligible in any language.

use std::sync::Arc;

use crate::config::RunConfig;
use crate::exec::SkipReason;
use crate::markdown::CodeBlock;
use crate::tags::{Tag, TagCatalog};
use crate::types::ExecutionMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible(ExecutionMode),
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
pub struct TagFilter {
    catalog: Arc<TagCatalog>,
    followed: Vec<String>,
    only_shell: bool,
}

impl TagFilter {
    pub fn new(catalog: Arc<TagCatalog>, config: &RunConfig) -> Self {
        let followed = config
            .followed_languages()
            .iter()
            .map(|lang| canonical_language(&catalog, lang))
            .collect();

        Self {
            catalog,
            followed,
            only_shell: config.only_run_shell(),
        }
    }

    pub fn evaluate(&self, block: &CodeBlock) -> Eligibility {
        if block.annotations().has(Tag::Ignore) {
            return Eligibility::Skipped(SkipReason::Annotated);
        }
        // File blocks only write their body, whatever the language.
        if block.annotations().value(Tag::FileName).is_some() {
            return Eligibility::Eligible(ExecutionMode::LineByLine);
        }

        let language = canonical_language(&self.catalog, block.language());
        if !self.followed.contains(&language) {
            return Eligibility::Skipped(SkipReason::Language(block.language().to_string()));
        }
        if self.only_shell && !self.catalog.is_shell_language(&language) {
            return Eligibility::Skipped(SkipReason::Language(block.language().to_string()));
        }

        if block.annotations().has(Tag::Session) {
            Eligibility::Eligible(ExecutionMode::Session)
        } else {
            Eligibility::Eligible(ExecutionMode::LineByLine)
        }
    }

    pub fn is_eligible(&self, block: &CodeBlock) -> bool {
        matches!(self.evaluate(block), Eligibility::Eligible(_))
    }
}

fn canonical_language(catalog: &TagCatalog, language: &str) -> String {
    match catalog.resolve_language(language) {
        Some(canonical) => canonical.to_string(),
        None => language.to_ascii_lowercase(),
    }
}
