//! Per-run output store and `$rule_<id>` token expansion
//!
//! Each executed rule that carries an `id` records its produced (or
//! passed-through) string here, and later rules can weave those strings
//! into their patterns, replacements, and input templates via
//! `$rule_<id>` tokens. The store lives for exactly one pipeline run.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

// A token is a dollar sign, the literal `rule`, an optional underscore,
// then an identifier. Plain `$1` capture references carry no marker and
// survive expansion for the regex-replacement stage.
static RULE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$rule_?([A-Za-z0-9_-]+)").expect("rule token pattern")
});

/// Append-only mapping from rule id to that rule's output during one run.
#[derive(Debug, Clone, Default)]
pub struct OutputStore {
    entries: HashMap<String, String>,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rule's output under its id.
    pub fn insert(&mut self, id: &str, value: impl Into<String>) {
        self.entries.insert(id.to_string(), value.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain copy of the store, for the end-of-run snapshot hook.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.clone()
    }

    /// Expand `$rule_<id>` tokens against the store.
    ///
    /// Each token resolves by the captured identifier verbatim, then by
    /// the identifier prefixed with `rule_`; tokens naming no stored
    /// output expand to the empty string.
    pub fn expand(&self, template: &str) -> String {
        RULE_TOKEN
            .replace_all(template, |caps: &Captures| {
                let ident = &caps[1];
                if let Some(value) = self.entries.get(ident) {
                    value.clone()
                } else if let Some(value) = self.entries.get(&format!("rule_{}", ident)) {
                    value.clone()
                } else {
                    String::new()
                }
            })
            .into_owned()
    }
}

/// Identifiers referenced by `$rule_<id>` tokens in a template.
///
/// Used by rule-set validation to flag forward references.
pub fn referenced_ids(template: &str) -> Vec<String> {
    RULE_TOKEN
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}
