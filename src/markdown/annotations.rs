// src/markdown/annotations.rs

//! Parsing of the annotation list that follows a fence's language.
//!
//! Annotations are space separated `key` or `key=value` tokens. A value may
//! be wrapped in `"` or `'` to contain spaces; inside quotes `\"`, `\'` and
//! `\\` are unescaped.

use crate::errors::{DocciError, Result};
use crate::tags::{Tag, TagCatalog, TAG_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub key: String,
    pub value: Option<String>,
    /// Resolved tag, `None` for annotations without a registered meaning.
    pub tag: Option<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    items: Vec<Annotation>,
}

impl Annotations {
    /// Parse the annotation part of an info string.
    ///
    /// Unknown `docci-` keys are rejected so that renamed tags surface
    /// instead of being silently ignored.
    pub fn parse(raw: &str, catalog: &TagCatalog) -> Result<Self> {
        let mut items = Vec::new();

        for token in split_tokens(raw) {
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (token, None),
            };

            let tag = catalog.resolve(&key);
            if tag.is_none() && key.starts_with(TAG_PREFIX) {
                return Err(DocciError::InvalidTag(key));
            }

            items.push(Annotation { key, value, tag });
        }

        Ok(Self { items })
    }

    pub fn has(&self, tag: Tag) -> bool {
        self.items.iter().any(|a| a.tag == Some(tag))
    }

    /// Value of the first occurrence of `tag` (or any alias of it).
    pub fn value(&self, tag: Tag) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.tag == Some(tag))
            .and_then(|a| a.value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split on whitespace, keeping quoted values (`key="a b"`) in one token.
pub fn split_tokens(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    match chars.peek() {
                        Some(&next) if next == q || next == '\\' => {
                            current.push(next);
                            chars.next();
                        }
                        _ => current.push(c),
                    }
                } else if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => {
                if c.is_whitespace() {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                } else if (c == '"' || c == '\'') && current.ends_with('=') {
                    quote = Some(c);
                } else {
                    current.push(c);
                }
            }
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_values_keep_their_spaces() {
        let tokens = split_tokens(r#" docci-output-contains="My Multi Word Value" docci-bg"#);
        assert_eq!(
            tokens,
            vec![
                "docci-output-contains=My Multi Word Value".to_string(),
                "docci-bg".to_string()
            ]
        );
    }

    #[test]
    fn escaped_quotes_are_unescaped() {
        let tokens = split_tokens(r#"title='it\'s' k="a \"b\" \\ c""#);
        assert_eq!(tokens, vec![r#"title=it's"#.to_string(), r#"k=a "b" \ c"#.to_string()]);
    }

    #[test]
    fn aliases_are_resolved_and_values_found() -> Result<()> {
        let catalog = TagCatalog::builtin();
        let annotations =
            Annotations::parse("docci-contains=hello docci-should-fail title=x", &catalog)?;

        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations.value(Tag::OutputContains), Some("hello"));
        assert!(annotations.has(Tag::AssertFailure));
        assert!(!annotations.has(Tag::Background));
        Ok(())
    }

    #[test]
    fn unknown_docci_tag_is_rejected() {
        let catalog = TagCatalog::builtin();
        let err = Annotations::parse("docci-delay=3", &catalog).unwrap_err();
        assert!(matches!(err, DocciError::InvalidTag(ref t) if t == "docci-delay"));
    }
}
