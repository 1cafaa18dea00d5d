//! Rule pipeline executor
//!
//! Folds an input string through an ordered rule list, threading an
//! explicit `(output, store)` accumulator. Per rule: resolve the input
//! (precedence: explicit `input` > `inputFieldPath` > `fromMap` fallback
//! > running output), expand `$rule_<id>` tokens in pattern and
//! replacement, compile, test, replace, record the output, and decide
//! whether to continue. The engine never panics on malformed rules: an
//! invalid pattern is a "no match" for that rule, and observer panics are
//! caught and logged.

use crate::error::{Error, Result};
use crate::filters::Maps;
use crate::outputs::OutputStore;
use crate::path;
use crate::rule::{Rule, RuleShape};
use crate::template::{self, CaptureData};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Options for one transform run.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Context tree rules may read via `inputFieldPath`
    pub context: Value,
    /// Named lookup tables for the `map` filter
    pub maps: Maps,
    /// Return the seed input when no rule matched (default). When false,
    /// a run with zero matches fails with [`Error::NoMatch`].
    pub return_original_on_no_match: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            context: Value::Null,
            maps: Maps::new(),
            return_original_on_no_match: true,
        }
    }
}

/// Per-rule evaluation trace handed to [`Observer::rule_evaluated`].
#[derive(Debug, Clone)]
pub struct RuleTrace<'a> {
    /// Position of the rule in the list
    pub index: usize,
    pub rule: &'a Rule,
    /// The input the rule was tested against (empty marker for array
    /// rules that produced no values)
    pub input: String,
    /// Pattern after token expansion and trimming
    pub pattern: String,
    /// Replacement after token expansion
    pub replacement: String,
    pub matched: bool,
}

/// Best-effort observation hooks.
///
/// All methods default to no-ops. The pipeline isolates every call: a
/// panicking observer is logged and discarded, never propagated, so a
/// diagnostic UI cannot take the engine down with it.
pub trait Observer {
    /// Fires for every rule processed, matched or not (including invalid
    /// patterns).
    fn rule_evaluated(&mut self, _trace: &RuleTrace) {}

    /// Fires only on an actual match/replace.
    fn rule_matched(&mut self, _rule: &Rule, _before: &str, _after: &str) {}

    /// Fires once with a copy of the final output store, after a run
    /// that did not fail strict no-match checking.
    fn outputs_collected(&mut self, _outputs: &HashMap<String, String>) {}
}

/// What one rule did to the accumulator.
pub(crate) struct RuleOutcome {
    pub(crate) matched: bool,
    pub(crate) output: Option<String>,
}

impl RuleOutcome {
    pub(crate) fn unmatched() -> Self {
        Self {
            matched: false,
            output: None,
        }
    }
}

/// Transform `input` by folding it through `rules`.
pub fn transform(input: &str, rules: &[Rule], options: &TransformOptions) -> Result<String> {
    Transformer::new(options).run(input, rules)
}

/// Configurable pipeline executor.
///
/// ```rust
/// use rulepipe::{transform, Rule, TransformOptions};
///
/// let rules = vec![Rule {
///     pattern: "^https?://[^/]+/s/[^/]+/([^/?#]+)(?:\\?.*)?$".into(),
///     replacement: "/$1".into(),
///     ..Rule::default()
/// }];
/// let out = transform(
///     "https://h/s/SFRADemo/mens-pant/44736828M.html?lang=en_US",
///     &rules,
///     &TransformOptions::default(),
/// )?;
/// assert_eq!(out, "/mens-pant/44736828M.html");
/// # Ok::<(), rulepipe::Error>(())
/// ```
pub struct Transformer<'a> {
    pub(crate) options: &'a TransformOptions,
    pub(crate) observer: Option<&'a mut dyn Observer>,
}

impl<'a> Transformer<'a> {
    pub fn new(options: &'a TransformOptions) -> Self {
        Self {
            options,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a mut dyn Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the pipeline. The only surfaced failure is [`Error::NoMatch`]
    /// in strict mode; everything else is absorbed per rule.
    pub fn run(&mut self, input: &str, rules: &[Rule]) -> Result<String> {
        let mut output = input.to_string();
        let mut store = OutputStore::new();
        let mut matched_any = false;

        for (index, rule) in rules.iter().enumerate() {
            let outcome = match rule.shape() {
                RuleShape::Scalar => self.run_scalar(index, rule, &output, &mut store),
                RuleShape::Array(array_path) => {
                    self.run_array(index, rule, &array_path, &output, &mut store)
                }
            };
            matched_any |= outcome.matched;
            if let Some(new_output) = outcome.output {
                output = new_output;
            }
            // Halts once this rule is reached, matched or not
            if rule.stop_on_match {
                debug!(rule = index, "stopOnMatch set, halting pipeline");
                break;
            }
        }

        if !matched_any && !self.options.return_original_on_no_match {
            return Err(Error::NoMatch);
        }
        self.notify_outputs(&store);
        Ok(output)
    }

    fn run_scalar(
        &mut self,
        index: usize,
        rule: &Rule,
        current: &str,
        store: &mut OutputStore,
    ) -> RuleOutcome {
        let input = self.resolve_input(rule, current, store);
        let pattern = store.expand(&rule.pattern).trim().to_string();
        let replacement = store.expand(&rule.replacement);

        let re = match compile(&pattern, &rule.flags) {
            Some(re) => re,
            None => {
                warn!(rule = index, pattern = %pattern, "invalid pattern, rule treated as unmatched");
                self.notify_evaluated(&RuleTrace {
                    index,
                    rule,
                    input: input.clone(),
                    pattern,
                    replacement,
                    matched: false,
                });
                if let Some(id) = &rule.id {
                    store.insert(id, input);
                }
                return RuleOutcome::unmatched();
            }
        };

        let matched = re.is_match(&input);
        debug!(rule = index, matched, "rule evaluated");
        self.notify_evaluated(&RuleTrace {
            index,
            rule,
            input: input.clone(),
            pattern: pattern.clone(),
            replacement: replacement.clone(),
            matched,
        });

        if !matched {
            if let Some(id) = &rule.id {
                store.insert(id, input);
            }
            return RuleOutcome::unmatched();
        }

        let after = apply_replacement(
            &re,
            &input,
            &replacement,
            rule.flags.contains('g'),
            &self.options.maps,
        );
        self.notify_matched(rule, &input, &after);
        if let Some(id) = &rule.id {
            store.insert(id, after.clone());
        }
        RuleOutcome {
            matched: true,
            output: Some(after),
        }
    }

    // Input precedence: explicit template > context path > fromMap
    // fallback > running output. Array paths divert to the fan-out
    // executor before this point.
    fn resolve_input(&self, rule: &Rule, current: &str, store: &OutputStore) -> String {
        if let Some(template) = &rule.input {
            return store.expand(template);
        }
        if let Some(field_path) = &rule.input_field_path {
            return path::resolve_string(&self.options.context, field_path);
        }
        if rule.from_map {
            // expanding an unset template
            return String::new();
        }
        current.to_string()
    }

    pub(crate) fn notify_evaluated(&mut self, trace: &RuleTrace) {
        if let Some(observer) = self.observer.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| observer.rule_evaluated(trace))).is_err() {
                warn!("rule_evaluated observer panicked; continuing");
            }
        }
    }

    pub(crate) fn notify_matched(&mut self, rule: &Rule, before: &str, after: &str) {
        if let Some(observer) = self.observer.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| observer.rule_matched(rule, before, after)))
                .is_err()
            {
                warn!("rule_matched observer panicked; continuing");
            }
        }
    }

    fn notify_outputs(&mut self, store: &OutputStore) {
        if let Some(observer) = self.observer.as_mut() {
            let snapshot = store.snapshot();
            if catch_unwind(AssertUnwindSafe(|| observer.outputs_collected(&snapshot))).is_err() {
                warn!("outputs_collected observer panicked; continuing");
            }
        }
    }
}

/// Compile a rule pattern with JS-style flag letters.
///
/// `g` is handled at replace time; unrecognized letters are ignored.
/// Returns `None` on a non-compilable pattern — the caller treats that
/// rule as unmatched.
pub(crate) fn compile(pattern: &str, flags: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .ok()
}

/// Replace matches of `re` in `input`, rendering the replacement per
/// match: through the template renderer when it carries `${...}`
/// placeholders, otherwise via native capture substitution.
pub(crate) fn apply_replacement(
    re: &Regex,
    input: &str,
    replacement: &str,
    global: bool,
    maps: &Maps,
) -> String {
    let replacer = |caps: &regex::Captures| -> String {
        let data = CaptureData::from_captures(caps, re);
        if template::is_template(replacement) {
            template::render(replacement, &data, maps)
        } else {
            template::expand_native(replacement, &data)
        }
    };
    if global {
        re.replace_all(input, replacer).into_owned()
    } else {
        re.replace(input, replacer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use serde_json::json;

    fn rule(pattern: &str, replacement: &str) -> Rule {
        Rule {
            pattern: pattern.into(),
            replacement: replacement.into(),
            ..Rule::default()
        }
    }

    #[test]
    fn test_single_rule_replace() {
        let rules = vec![rule("(mens)", "womans")];
        let out = transform("/mens-pant", &rules, &TransformOptions::default());
        assert_eq!(out.expect("transform"), "/womans-pant");
    }

    #[test]
    fn test_unmatched_rule_passes_through() {
        let rules = vec![rule("zzz", "x")];
        let out = transform("input", &rules, &TransformOptions::default());
        assert_eq!(out.expect("transform"), "input");
    }

    #[test]
    fn test_global_flag_replaces_all() {
        let mut all = rule("a", "b");
        all.flags = "g".into();
        let out = transform("banana", &[all], &TransformOptions::default());
        assert_eq!(out.expect("transform"), "bbnbnb");

        let first = rule("a", "b");
        let out = transform("banana", &[first], &TransformOptions::default());
        assert_eq!(out.expect("transform"), "bbnana");
    }

    #[test]
    fn test_case_insensitive_flag() {
        let mut r = rule("(MENS)", "womans");
        r.flags = "i".into();
        let out = transform("/mens-pant", &[r], &TransformOptions::default());
        assert_eq!(out.expect("transform"), "/womans-pant");
    }

    #[test]
    fn test_invalid_pattern_is_absorbed() {
        let rules = vec![rule("(unclosed", "x"), rule("(mens)", "womans")];
        let out = transform("/mens-pant", &rules, &TransformOptions::default());
        assert_eq!(out.expect("transform"), "/womans-pant");
    }

    #[test]
    fn test_strict_mode_requires_a_match() {
        let options = TransformOptions {
            return_original_on_no_match: false,
            ..TransformOptions::default()
        };
        let err = transform("input", &[rule("zzz", "x")], &options);
        assert!(matches!(err, Err(Error::NoMatch)));

        let err = transform("input", &[], &options);
        assert!(matches!(err, Err(Error::NoMatch)));
    }

    #[test]
    fn test_empty_rule_list_is_identity() {
        let out = transform("input", &[], &TransformOptions::default());
        assert_eq!(out.expect("transform"), "input");
    }

    #[test]
    fn test_input_field_path_overrides_running_output() {
        let options = TransformOptions {
            context: json!({"product": {"data": [{"slugUrl": "/mens-shoe"}]}}),
            ..TransformOptions::default()
        };
        let mut r = rule("(mens)", "womans");
        r.input_field_path = Some("product.data[0].slugUrl".into());
        let out = transform("ignored seed", &[r], &options);
        assert_eq!(out.expect("transform"), "/womans-shoe");
    }

    #[test]
    fn test_path_miss_coerces_to_empty_input() {
        let mut r = rule("^$", "empty");
        r.input_field_path = Some("no.such.path".into());
        let out = transform("seed", &[r], &TransformOptions::default());
        assert_eq!(out.expect("transform"), "empty");
    }

    #[test]
    fn test_from_map_fallback_is_empty_input() {
        let mut r = rule("^$", "was-empty");
        r.from_map = true;
        let out = transform("seed", &[r], &TransformOptions::default());
        assert_eq!(out.expect("transform"), "was-empty");
    }
}
