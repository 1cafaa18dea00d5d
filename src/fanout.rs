//! Array-rule fan-out
//!
//! A rule whose `inputFieldPath` carries a `[*]` segment runs once per
//! item of the selected collection slice, and the per-item results are
//! rejoined with `joinWith`. Anything that fails to produce values — a
//! non-collection path, an out-of-range slice, items without usable
//! strings — degrades to a no-match for the whole rule.

use crate::outputs::OutputStore;
use crate::path::{self, ArrayPath};
use crate::pipeline::{apply_replacement, compile, RuleOutcome, RuleTrace, Transformer};
use crate::rule::Rule;
use serde_json::Value;
use tracing::warn;

impl<'a> Transformer<'a> {
    pub(crate) fn run_array(
        &mut self,
        index: usize,
        rule: &Rule,
        array_path: &ArrayPath,
        current: &str,
        store: &mut OutputStore,
    ) -> RuleOutcome {
        let pattern = store.expand(&rule.pattern).trim().to_string();
        let replacement = store.expand(&rule.replacement);

        let empty: Vec<Value> = Vec::new();
        let items = path::resolve(&self.options.context, &array_path.array_path)
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        let values = slice_values(items, rule, array_path);

        if values.is_empty() {
            return self.array_no_match(index, rule, pattern, replacement, current, store);
        }

        let re = match compile(&pattern, &rule.flags) {
            Some(re) => re,
            None => {
                warn!(rule = index, pattern = %pattern, "invalid pattern, array rule treated as unmatched");
                return self.array_no_match(index, rule, pattern, replacement, current, store);
            }
        };

        let join = rule.join_with.as_deref().unwrap_or("");
        let before = values.join(join);
        let matched = values.iter().any(|value| re.is_match(value));
        self.notify_evaluated(&RuleTrace {
            index,
            rule,
            input: before.clone(),
            pattern,
            replacement: replacement.clone(),
            matched,
        });

        let global = rule.flags.contains('g');
        let after = values
            .iter()
            .map(|value| apply_replacement(&re, value, &replacement, global, &self.options.maps))
            .collect::<Vec<_>>()
            .join(join);

        if matched {
            self.notify_matched(rule, &before, &after);
        }
        if let Some(id) = &rule.id {
            store.insert(id, after.clone());
        }
        RuleOutcome {
            matched,
            output: Some(after),
        }
    }

    // Empty slice or invalid pattern: pass the running output through,
    // trace with an empty input marker, leave the output untouched.
    fn array_no_match(
        &mut self,
        index: usize,
        rule: &Rule,
        pattern: String,
        replacement: String,
        current: &str,
        store: &mut OutputStore,
    ) -> RuleOutcome {
        self.notify_evaluated(&RuleTrace {
            index,
            rule,
            input: String::new(),
            pattern,
            replacement,
            matched: false,
        });
        if let Some(id) = &rule.id {
            store.insert(id, current);
        }
        RuleOutcome::unmatched()
    }
}

// Clamp the slice bounds into the collection, then extract one string
// per item: through the per-item sub-path when given (skipping items
// where it resolves to nothing), otherwise keeping only items that are
// already strings.
fn slice_values(items: &[Value], rule: &Rule, array_path: &ArrayPath) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }
    let len = items.len() as i64;
    // start may clamp to len (one past the end) so that a start beyond
    // the collection empties the slice instead of pinning to the last item
    let start = rule.start_index.unwrap_or(0).clamp(0, len);
    let end = rule.end_index.unwrap_or(len - 1).clamp(0, len - 1);
    if start > end {
        return Vec::new();
    }
    items[start as usize..=end as usize]
        .iter()
        .filter_map(|item| match &array_path.item_path {
            Some(sub) => path::resolve(item, sub).and_then(path::coerce_str),
            None => item.as_str().map(str::to_string),
        })
        .collect()
}
