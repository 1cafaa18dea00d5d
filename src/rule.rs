//! Rule and rule-set models — the configuration data model
//!
//! Rules are deserialized from host-authored JSON configuration (camelCase
//! wire names). Loading is permissive: every field has a default, unknown
//! fields are ignored, and malformed entries are dropped with a warning
//! rather than failing the whole list, because the consumer is a live
//! editing UI that must keep working on partial configuration.
//!
//! ## Example rule list
//!
//! ```json
//! [
//!   {
//!     "id": "rule_1",
//!     "inputFieldPath": "product.data[0].slugUrl",
//!     "pattern": "^(?:https?://)?[^/]+/s/[^/]+/([^?#]+)$",
//!     "flags": "i",
//!     "replacement": "/$1"
//!   },
//!   {
//!     "id": "rule_2",
//!     "input": "$rule_1",
//!     "pattern": "(mens)",
//!     "flags": "i",
//!     "replacement": "womans"
//!   }
//! ]
//! ```

use crate::error::{Error, Result};
use crate::outputs;
use crate::path::ArrayPath;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// One declarative step in a transform pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Identifier, unique within a rule list; key into the output store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Regex pattern source; may contain `$rule_<id>` tokens, expanded
    /// before compilation
    #[serde(default)]
    pub pattern: String,

    /// JS-style flag letters; recognized: `i`, `g`, `m`, `s`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flags: String,

    /// Native capture substitution (`$1`, `$<name>`) or a `${...}`
    /// template
    #[serde(default)]
    pub replacement: String,

    /// Halt the pipeline after this rule is processed
    #[serde(default)]
    pub stop_on_match: bool,

    /// Deep path into the context object; overrides the running output.
    /// A `[*]` segment turns the rule into an array rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_field_path: Option<String>,

    /// Explicit input template; highest precedence; may reference
    /// `$rule_<id>` tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Back-compat alias: compute the input by expanding `input` even
    /// when it is unset
    #[serde(default)]
    pub from_map: bool,

    /// First item of the array slice (array rules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,

    /// Last item of the array slice, inclusive (array rules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,

    /// Separator when rejoining array-rule items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_with: Option<String>,

    /// Free text, diagnostic only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Load-time classification of a rule's execution shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleShape {
    /// Plain match/replace over a single input string
    Scalar,
    /// Fan out over a collection selected by an `[*]` path
    Array(ArrayPath),
}

impl Rule {
    /// Classify the rule's execution shape.
    ///
    /// An explicit `input` keeps the rule scalar even when
    /// `inputFieldPath` carries a wildcard: the input template takes
    /// precedence over the path.
    pub fn shape(&self) -> RuleShape {
        if self.input.is_none() {
            if let Some(path) = &self.input_field_path {
                if let Some(array_path) = ArrayPath::parse(path) {
                    return RuleShape::Array(array_path);
                }
            }
        }
        RuleShape::Scalar
    }
}

/// An ordered rule list plus its loading and validation operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse a rule set from a JSON array string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::RuleParse(e.to_string()))
    }

    /// Serialize the rule set to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::RuleParse(e.to_string()))
    }

    /// Resolve a rule list from a host configuration value.
    ///
    /// Supports the configuration shapes hosts are known to store: a flat
    /// array, an object with a `rules` array, an object keyed by
    /// content-type uid whose value is either of those, and finally the
    /// first key's value. Unrecognized shapes resolve to an empty list;
    /// this operation never fails.
    pub fn from_config(config: &Value, content_type: Option<&str>) -> Self {
        if let Some(rules) = rules_from(config) {
            return Self::new(rules);
        }
        if let Some(uid) = content_type {
            if let Some(by_type) = config.get(uid) {
                if let Some(rules) = rules_from(by_type) {
                    return Self::new(rules);
                }
            }
        }
        if let Some(object) = config.as_object() {
            if let Some((_, first)) = object.iter().next() {
                if let Some(rules) = rules_from(first) {
                    return Self::new(rules);
                }
            }
        }
        Self::default()
    }

    /// Get a rule by id.
    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id.as_deref() == Some(id))
    }

    /// The first rule carrying an `inputFieldPath`.
    ///
    /// Hosts use this to seed the pipeline input from the entry data.
    pub fn first_input_field_path(&self) -> Option<&str> {
        self.rules
            .iter()
            .find_map(|r| r.input_field_path.as_deref())
    }

    /// Validate the rule list for likely configuration mistakes.
    ///
    /// Returns human-readable diagnostics; the engine itself never
    /// rejects a loaded rule, so these are warnings for the editing UI.
    pub fn validate(&self) -> Vec<String> {
        let mut findings = Vec::new();

        let mut seen_ids = HashSet::new();
        for rule in &self.rules {
            if let Some(id) = &rule.id {
                if !seen_ids.insert(id.as_str()) {
                    findings.push(format!("Duplicate rule id: {}", id));
                }
            }
        }

        // Forward references resolve to empty strings at run time
        let mut defined: HashSet<&str> = HashSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let mut tokens = outputs::referenced_ids(&rule.pattern);
            tokens.extend(outputs::referenced_ids(&rule.replacement));
            if let Some(input) = &rule.input {
                tokens.extend(outputs::referenced_ids(input));
            }
            for token in tokens {
                let prefixed = format!("rule_{}", token);
                if !defined.contains(token.as_str()) && !defined.contains(prefixed.as_str()) {
                    findings.push(format!(
                        "Rule {} references ${} before any earlier rule produces it",
                        index, prefixed
                    ));
                }
            }
            if let Some(id) = &rule.id {
                defined.insert(id.as_str());
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            let is_scalar = matches!(rule.shape(), RuleShape::Scalar);
            let has_slice_fields =
                rule.start_index.is_some() || rule.end_index.is_some() || rule.join_with.is_some();
            if is_scalar && has_slice_fields {
                findings.push(format!(
                    "Rule {} sets array-slicing fields without an [*] input path; they have no effect",
                    index
                ));
            }
            if rule.stop_on_match && index + 1 < self.rules.len() {
                findings.push(format!(
                    "Rule {} stops the pipeline when reached; {} later rule(s) never run",
                    index,
                    self.rules.len() - index - 1
                ));
            }
        }

        findings
    }

    /// Compute a short content hash for change detection.
    pub fn hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let content = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
    }
}

// A rule list is either an array of rule objects or an object wrapping
// one under `rules`. Malformed entries are dropped, not fatal.
fn rules_from(value: &Value) -> Option<Vec<Rule>> {
    let list = if value.is_array() {
        value
    } else {
        value.get("rules")?
    };
    let items = list.as_array()?;
    let mut rules = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<Rule>(item.clone()) {
            Ok(rule) => rules.push(rule),
            Err(e) => warn!(index, error = %e, "dropping malformed rule entry"),
        }
    }
    Some(rules)
}
