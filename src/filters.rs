//! Replacement-template filters
//!
//! Pure string-to-string functions applied left-to-right inside `${...}`
//! placeholders. The library is fixed; unknown filter names fail open and
//! pass the value through unchanged, so a typo in a rule configuration
//! degrades the output instead of crashing the host.

use crate::pipeline::compile;
use std::collections::HashMap;

/// Named lookup tables for the `map` filter, supplied via
/// [`crate::pipeline::TransformOptions`].
pub type Maps = HashMap<String, HashMap<String, String>>;

/// Apply one filter call to a value.
pub fn apply(name: &str, value: String, args: &[String], maps: &Maps) -> String {
    match name {
        "lower" => value.to_lowercase(),
        "upper" => value.to_uppercase(),
        "trim" => value.trim().to_string(),
        "replace" => replace_literal(value, args),
        "regexReplace" => regex_replace(value, args),
        "default" => {
            if value.is_empty() {
                args.first().cloned().unwrap_or_default()
            } else {
                value
            }
        }
        "map" => map_lookup(value, args, maps),
        "substr" => substr(&value, args),
        "urlEncode" => urlencoding::encode(&value).into_owned(),
        "urlDecode" => match urlencoding::decode(&value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value,
        },
        _ => value,
    }
}

/// Split a filter call on `:` into a name and arguments.
///
/// A backslash escapes a literal colon inside an argument.
pub fn parse_call(call: &str) -> (String, Vec<String>) {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = call.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&':') => {
                current.push(':');
                chars.next();
            }
            ':' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    let name = parts.remove(0).trim().to_string();
    (name, parts)
}

fn replace_literal(value: String, args: &[String]) -> String {
    let from = args.first().map(String::as_str).unwrap_or("");
    if from.is_empty() {
        return value;
    }
    let to = args.get(1).map(String::as_str).unwrap_or("");
    value.replace(from, to)
}

fn regex_replace(value: String, args: &[String]) -> String {
    let pattern = match args.first() {
        Some(p) => p,
        None => return value,
    };
    let repl = args.get(1).map(String::as_str).unwrap_or("");
    let flags = args.get(2).map(String::as_str).unwrap_or("");
    let re = match compile(pattern, flags) {
        Some(re) => re,
        None => return value,
    };
    let replacer = |caps: &regex::Captures| -> String {
        let data = crate::template::CaptureData::from_captures(caps, &re);
        crate::template::expand_native(repl, &data)
    };
    if flags.contains('g') {
        re.replace_all(&value, replacer).into_owned()
    } else {
        re.replace(&value, replacer).into_owned()
    }
}

fn map_lookup(value: String, args: &[String], maps: &Maps) -> String {
    let table = match args.first().and_then(|name| maps.get(name)) {
        Some(table) => table,
        None => return value,
    };
    if let Some(mapped) = table.get(&value) {
        return mapped.clone();
    }
    if let Some(mapped) = table.get(&value.to_lowercase()) {
        return mapped.clone();
    }
    value
}

// Character-based substring with JS `substr` semantics: negative start
// counts from the end, omitted length means "to end".
fn substr(value: &str, args: &[String]) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;
    let start = args
        .first()
        .and_then(|a| a.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let start = if start < 0 {
        (len + start).max(0)
    } else {
        start.min(len)
    };
    let take = match args.get(1) {
        Some(a) => a.trim().parse::<i64>().ok().unwrap_or(0).max(0),
        None => len - start,
    };
    let end = (start + take).min(len);
    chars[start as usize..end as usize].iter().collect()
}
