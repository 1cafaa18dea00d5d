// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # Rulepipe — rule-based string transformation
//!
//! A small, declarative, chainable DSL: take a string and a context
//! object, fold the string through an ordered list of regex match/replace
//! rules, and return the transformed result. Each rule's input can come
//! from the running output, a deep path into the context, or the outputs
//! of earlier rules, and its replacement can use a template mini-language
//! with named filters.
//!
//! The engine is built for live editorial UIs: it is deterministic, fully
//! synchronous, and fails safe. Invalid patterns count as "no match",
//! unknown filters pass values through, context misses coerce to empty
//! strings, and observer callbacks can never take the pipeline down.
//!
//! ## Quick Start
//!
//! ```rust
//! use rulepipe::{transform, RuleSet, TransformOptions};
//! use serde_json::json;
//!
//! let rules = RuleSet::from_json(r#"[
//!   {
//!     "id": "rule_1",
//!     "pattern": "^(?:https?://)?[^/]+/s/[^/]+/([^?#]+)(?:\\?[^#]*)?$",
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
//! ]"#)?;
//!
//! let options = TransformOptions {
//!     context: json!({}),
//!     ..TransformOptions::default()
//! };
//! let out = transform(
//!     "https://shop.example.com/s/RefArch/mens-pant/44736828M.html?lang=en_US",
//!     &rules.rules,
//!     &options,
//! )?;
//! assert_eq!(out, "/womans-pant/44736828M.html");
//! # Ok::<(), rulepipe::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! seed string ──┐
//!               │    per rule, in list order:
//! rule list ────┼──►   resolve input   (input > inputFieldPath > fromMap > running)
//!               │      expand tokens   ($rule_<id> from the output store)
//! context ──────┘      compile + test  (invalid pattern = no match)
//!                      replace         (native $1/$<name> or ${ref|filter} template)
//!                      record output   (store under the rule's id)
//!                      stop or continue
//!                            │
//!                            ▼
//!                  transformed string + output store
//! ```
//!
//! A rule whose `inputFieldPath` selects a collection (`items[*].title`)
//! fans out over a slice of the collection and rejoins the per-item
//! results; see [`rule::RuleShape`].
//!
//! ## Replacement templates
//!
//! `${ <reference> | <filter>:<arg>... }` — the reference is `$N` (Nth
//! capture, 0 = whole match), `$<name>` (named group), or a raw literal.
//! Filters apply left-to-right: `lower`, `upper`, `trim`,
//! `replace:from:to`, `regexReplace:pattern:repl[:flags]`,
//! `default:fallback`, `map:table`, `substr:start[:len]`, `urlEncode`,
//! `urlDecode`. Unknown names pass the value through unchanged.

// Core modules
pub mod error;
pub mod filters;
pub mod outputs;
pub mod path;
pub mod pipeline;
pub mod rule;
pub mod template;

// Array-rule fan-out (pipeline internals)
mod fanout;

// Re-exports
pub use error::{Error, Result};
pub use filters::Maps;
pub use outputs::OutputStore;
pub use path::ArrayPath;
pub use pipeline::{transform, Observer, RuleTrace, TransformOptions, Transformer};
pub use rule::{Rule, RuleSet, RuleShape};
pub use template::CaptureData;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
