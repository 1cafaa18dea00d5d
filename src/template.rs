//! Replacement templates and capture data
//!
//! A replacement string either uses native capture substitution (`$1`,
//! `$<name>`) or, when it contains `${...}` placeholders, the template
//! mini-language: `${ <reference> | <filter>:<arg>... }` with filters
//! applied left-to-right. Capture data is built fresh for each individual
//! match and discarded after rendering.

use crate::filters::{self, Maps};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}]*)\}").expect("placeholder pattern")
});

static INDEX_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$(\d+)$").expect("index reference pattern")
});

static NAME_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$<([A-Za-z0-9_]+)>$").expect("name reference pattern")
});

// The JS `String.replace` substitution set the native path honors:
// `$$`, `$&`, `$N`, `$<name>`.
static NATIVE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\$|&|\d{1,2}|<[A-Za-z0-9_]+>)").expect("native reference pattern")
});

/// Capture groups of one regex match: indexed substrings (0 = whole
/// match) and named groups, either of which may be unparticipating.
#[derive(Debug, Clone, Default)]
pub struct CaptureData {
    pub by_index: Vec<Option<String>>,
    pub by_name: HashMap<String, Option<String>>,
}

impl CaptureData {
    pub fn from_captures(caps: &Captures, re: &Regex) -> Self {
        let by_index = (0..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        let mut by_name = HashMap::new();
        for name in re.capture_names().flatten() {
            by_name.insert(
                name.to_string(),
                caps.name(name).map(|m| m.as_str().to_string()),
            );
        }
        Self { by_index, by_name }
    }

    /// Nth capture, empty when absent or unparticipating.
    pub fn index(&self, i: usize) -> String {
        self.by_index.get(i).cloned().flatten().unwrap_or_default()
    }

    /// Named capture, empty when absent or unparticipating.
    pub fn name(&self, name: &str) -> String {
        self.by_name.get(name).cloned().flatten().unwrap_or_default()
    }
}

/// True when a replacement string uses template placeholders.
pub fn is_template(replacement: &str) -> bool {
    replacement.contains("${")
}

/// Render `${...}` placeholders against one match's captures.
pub fn render(template: &str, captures: &CaptureData, maps: &Maps) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            render_placeholder(&caps[1], captures, maps)
        })
        .into_owned()
}

fn render_placeholder(body: &str, captures: &CaptureData, maps: &Maps) -> String {
    let mut segments = body.split('|');
    let reference = segments.next().unwrap_or("").trim();
    let mut value = resolve_reference(reference, captures);
    for call in segments {
        let (name, args) = filters::parse_call(call.trim());
        value = filters::apply(&name, value, &args, maps);
    }
    value
}

// `$N` -> Nth capture, `$<name>` -> named group, anything else is a raw
// literal.
fn resolve_reference(reference: &str, captures: &CaptureData) -> String {
    if let Some(caps) = INDEX_REF.captures(reference) {
        return caps[1]
            .parse::<usize>()
            .map(|i| captures.index(i))
            .unwrap_or_default();
    }
    if let Some(caps) = NAME_REF.captures(reference) {
        return captures.name(&caps[1]);
    }
    reference.to_string()
}

/// Native capture substitution for non-template replacements.
pub fn expand_native(replacement: &str, captures: &CaptureData) -> String {
    NATIVE_REF
        .replace_all(replacement, |caps: &Captures| {
            let token = &caps[1];
            match token {
                "$" => "$".to_string(),
                "&" => captures.index(0),
                t if t.starts_with('<') => captures.name(&t[1..t.len() - 1]),
                t => t
                    .parse::<usize>()
                    .map(|i| captures.index(i))
                    .unwrap_or_default(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures_for(pattern: &str, haystack: &str) -> (CaptureData, Regex) {
        let re = Regex::new(pattern).expect("test pattern");
        let caps = re.captures(haystack).expect("test match");
        (CaptureData::from_captures(&caps, &re), re)
    }

    #[test]
    fn test_render_indexed_reference() {
        let (data, _) = captures_for(r"(\w+)-(\w+)", "mens-pant");
        assert_eq!(render("${$1}/${$2}", &data, &Maps::new()), "mens/pant");
        assert_eq!(render("${$0}", &data, &Maps::new()), "mens-pant");
    }

    #[test]
    fn test_render_named_reference() {
        let (data, _) = captures_for(r"(?<country>[a-z]{2})", "us");
        assert_eq!(render("/${$<country>|upper}", &data, &Maps::new()), "/US");
    }

    #[test]
    fn test_render_filter_chain_left_to_right() {
        let (data, _) = captures_for(r"(\w+)", "hello");
        assert_eq!(
            render("${$1|upper|substr:0:3}", &data, &Maps::new()),
            "HEL"
        );
    }

    #[test]
    fn test_render_raw_literal_reference() {
        let data = CaptureData::default();
        assert_eq!(render("${fixed|upper}", &data, &Maps::new()), "FIXED");
    }

    #[test]
    fn test_render_missing_capture_is_empty() {
        let (data, _) = captures_for(r"(a)(b)?", "a");
        assert_eq!(render("[${$2}]", &data, &Maps::new()), "[]");
        assert_eq!(render("[${$9}]", &data, &Maps::new()), "[]");
    }

    #[test]
    fn test_render_leaves_text_outside_placeholders() {
        let (data, _) = captures_for(r"(x)", "x");
        assert_eq!(render("/pre/${$1}/post", &data, &Maps::new()), "/pre/x/post");
    }

    #[test]
    fn test_expand_native_numbered_and_named() {
        let (data, _) = captures_for(r"(?<first>\w+)-(\w+)", "mens-pant");
        assert_eq!(expand_native("/$1/$2", &data), "/mens/pant");
        assert_eq!(expand_native("/$<first>", &data), "/mens");
        assert_eq!(expand_native("[$&]", &data), "[mens-pant]");
        assert_eq!(expand_native("$$1", &data), "$1");
    }

    #[test]
    fn test_expand_native_unparticipating_group_is_empty() {
        let (data, _) = captures_for(r"(a)(b)?", "a");
        assert_eq!(expand_native("<$2>", &data), "<>");
    }

    #[test]
    fn test_is_template() {
        assert!(is_template("x${$1}"));
        assert!(!is_template("/$1"));
    }
}
