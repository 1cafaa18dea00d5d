//! Deep-path resolution over JSON-like context trees
//!
//! Paths use dotted segments with optional bracket indices:
//! `product.data[0].slugUrl` is equivalent to `product.data.0.slugUrl`.
//! Absence is represented structurally — this module never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static BRACKET_INDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)\]").expect("bracket index pattern")
});

/// Resolve a deep path against a JSON value tree.
///
/// Returns `None` as soon as any intermediate value is null or absent.
/// Numeric segments index arrays by position and objects by the literal
/// key, so an object key `"0"` still resolves.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let normalized = BRACKET_INDEX.replace_all(path, ".$1");
    let mut current = root;
    for segment in normalized.split('.').filter(|s| !s.is_empty()) {
        if current.is_null() {
            return None;
        }
        current = match current {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String coercion for context values.
///
/// Null coerces to `None`; strings pass through; numbers and booleans
/// render naturally; arrays and objects render as compact JSON.
pub fn coerce_str(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => serde_json::to_string(other).ok(),
    }
}

/// Resolve a path and coerce the result, treating misses as empty.
pub fn resolve_string(root: &Value, path: &str) -> String {
    resolve(root, path).and_then(coerce_str).unwrap_or_default()
}

/// A context path selecting a collection: `items[*].title` splits into
/// the collection path (`items`) and a per-item sub-path (`title`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayPath {
    /// Path to the collection itself
    pub array_path: String,
    /// Optional path resolved against each item
    pub item_path: Option<String>,
}

impl ArrayPath {
    /// Split a path at its first `[*]` segment.
    ///
    /// Returns `None` when the path carries no wildcard.
    pub fn parse(path: &str) -> Option<ArrayPath> {
        let at = path.find("[*]")?;
        let array_path = path[..at].trim_end_matches('.').to_string();
        let rest = path[at + 3..].trim_start_matches('.');
        Some(ArrayPath {
            array_path,
            item_path: (!rest.is_empty()).then(|| rest.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_dotted_path() {
        let root = json!({"a": {"b": {"c": 42}}});
        assert_eq!(resolve(&root, "a.b.c"), Some(&json!(42)));
    }

    #[test]
    fn test_resolve_bracket_index() {
        let root = json!({"product": {"data": [{"slugUrl": "https://example.com/x"}]}});
        assert_eq!(
            resolve(&root, "product.data[0].slugUrl"),
            Some(&json!("https://example.com/x"))
        );
        // bracket and dotted forms are equivalent
        assert_eq!(
            resolve(&root, "product.data.0.slugUrl"),
            Some(&json!("https://example.com/x"))
        );
    }

    #[test]
    fn test_resolve_leading_dot_and_empty_segments() {
        let root = json!({"a": {"b": 1}});
        assert_eq!(resolve(&root, ".a.b"), Some(&json!(1)));
        assert_eq!(resolve(&root, "a..b"), Some(&json!(1)));
    }

    #[test]
    fn test_resolve_miss_is_none() {
        let root = json!({"a": {"b": null}});
        assert_eq!(resolve(&root, "a.missing"), None);
        assert_eq!(resolve(&root, "a.b.c"), None);
        assert_eq!(resolve(&root, "a[0]"), None);
        assert_eq!(resolve(&root, ""), None);
    }

    #[test]
    fn test_numeric_object_key() {
        let root = json!({"a": {"0": "zero"}});
        assert_eq!(resolve(&root, "a[0]"), Some(&json!("zero")));
    }

    #[test]
    fn test_coerce_str() {
        assert_eq!(coerce_str(&json!("s")), Some("s".into()));
        assert_eq!(coerce_str(&json!(7)), Some("7".into()));
        assert_eq!(coerce_str(&json!(true)), Some("true".into()));
        assert_eq!(coerce_str(&json!(null)), None);
        assert_eq!(coerce_str(&json!(["a", 1])), Some("[\"a\",1]".into()));
    }

    #[test]
    fn test_resolve_string_treats_miss_as_empty() {
        let root = json!({"a": 1});
        assert_eq!(resolve_string(&root, "a"), "1");
        assert_eq!(resolve_string(&root, "nope"), "");
    }

    #[test]
    fn test_array_path_parse() {
        let ap = ArrayPath::parse("items[*].title").expect("array path");
        assert_eq!(ap.array_path, "items");
        assert_eq!(ap.item_path.as_deref(), Some("title"));

        let ap = ArrayPath::parse("a.b[*]").expect("array path");
        assert_eq!(ap.array_path, "a.b");
        assert_eq!(ap.item_path, None);

        assert_eq!(ArrayPath::parse("a.b[0]"), None);
    }

    #[test]
    fn test_array_path_trailing_dot_forms() {
        let ap = ArrayPath::parse("items.[*].meta.title").expect("array path");
        assert_eq!(ap.array_path, "items");
        assert_eq!(ap.item_path.as_deref(), Some("meta.title"));
    }
}
