//! Action parsing errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::result::ErrorKind;

/// Longest snippet of offending text kept in a [`ParseError`].
const SNIPPET_CHARS: usize = 160;

/// Why the brain's output could not become an [`Action`](crate::Action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// No balanced JSON object could be decoded.
    Malformed,
    /// An object was decoded but does not have the action's shape.
    SchemaViolation,
}

impl From<ParseErrorKind> for ErrorKind {
    fn from(kind: ParseErrorKind) -> Self {
        match kind {
            ParseErrorKind::Malformed => ErrorKind::Malformed,
            ParseErrorKind::SchemaViolation => ErrorKind::SchemaViolation,
        }
    }
}

/// A recoverable failure to parse one brain output.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct ParseError {
    /// Classification.
    pub kind: ParseErrorKind,
    /// What was wrong.
    pub message: String,
    /// Bounded prefix of the text that failed.
    pub snippet: String,
}

impl ParseError {
    /// No action object found or decodable.
    pub fn malformed(message: impl Into<String>, text: &str) -> Self {
        Self {
            kind: ParseErrorKind::Malformed,
            message: message.into(),
            snippet: snippet(text),
        }
    }

    /// An object was found but its fields are wrong.
    pub fn schema_violation(message: impl Into<String>, text: &str) -> Self {
        Self {
            kind: ParseErrorKind::SchemaViolation,
            message: message.into(),
            snippet: snippet(text),
        }
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
