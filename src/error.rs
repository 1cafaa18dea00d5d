//! Error types for rulepipe

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Rulepipe errors
///
/// A transform run surfaces exactly one failure: [`Error::NoMatch`], and
/// only when strict mode is requested. Everything else the engine absorbs:
/// invalid patterns count as "no match" for their rule, path misses resolve
/// to empty strings, and observer panics are caught and logged. The loading
/// layer can additionally report parse failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No transform rule matched input")]
    NoMatch,

    #[error("Rule parse error: {0}")]
    RuleParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
