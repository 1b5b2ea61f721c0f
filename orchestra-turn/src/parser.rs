//! Extract an [`Action`] from raw brain output.
//!
//! Models wrap their JSON in prose, code fences and hidden reasoning. The
//! parser strips reasoning segments, then makes one pass over the text
//! collecting balanced `{...}` spans (string- and escape-aware) and takes the
//! earliest-starting one that decodes as a JSON object. Only then is the
//! object checked for the action's shape.
//!
//! A marker quoted inside a JSON string (an answer that talks about a
//! `<think>` tag) is text, not a marker.

use std::ops::Range;

use orchestra_types::{Action, FINISH_TOOL, ParseError};
use serde_json::{Map, Value};

const TOOL_KEYS: [&str; 3] = ["toolName", "tool", "tool_name"];
const ARGUMENT_KEYS: [&str; 2] = ["arguments", "parameters"];

/// Parser for brain output. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct ActionParser {
    markers: Vec<(String, String)>,
}

impl Default for ActionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionParser {
    /// Parser that hides `<think>` and `<reasoning>` segments.
    pub fn new() -> Self {
        Self {
            markers: vec![
                ("<think>".into(), "</think>".into()),
                ("<reasoning>".into(), "</reasoning>".into()),
            ],
        }
    }

    /// Also hide segments between `open` and `close`.
    #[must_use]
    pub fn with_marker(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.markers.push((open.into(), close.into()));
        self
    }

    /// Parse one brain output.
    pub fn parse(&self, raw: &str) -> Result<Action, ParseError> {
        let visible = self.strip_reasoning(raw);
        let object = first_json_object(&visible, raw)?;
        action_from_object(object, raw)
    }

    /// Remove hidden-reasoning segments.
    ///
    /// An opening marker without a closing one hides the rest of the text; a
    /// closing marker with no opening one hides everything before it.
    /// Markers inside JSON string literals are left alone.
    pub fn strip_reasoning(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for (open, close) in &self.markers {
            text = strip_marker(&text, open, close);
        }
        text
    }
}

fn strip_marker(text: &str, open: &str, close: &str) -> String {
    let quoted = scan(text).strings;
    let unquoted = |marker: &str| -> Vec<usize> {
        text.match_indices(marker)
            .map(|(at, _)| at)
            .filter(|&at| !within(&quoted, at))
            .collect()
    };
    let opens = unquoted(open);
    let closes = unquoted(close);

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    loop {
        let next_open = first_from(&opens, pos);
        let next_close = first_from(&closes, pos);
        // Whatever came before a stray closer was hidden reasoning.
        if let Some(c) = next_close.filter(|&c| next_open.is_none_or(|o| c < o)) {
            out.clear();
            pos = c + close.len();
            continue;
        }
        let Some(o) = next_open else {
            out.push_str(&text[pos..]);
            return out;
        };
        out.push_str(&text[pos..o]);
        match first_from(&closes, o + open.len()) {
            Some(c) => pos = c + close.len(),
            None => return out,
        }
    }
}

fn first_from(sorted: &[usize], from: usize) -> Option<usize> {
    sorted.get(sorted.partition_point(|&at| at < from)).copied()
}

fn within(ranges: &[Range<usize>], at: usize) -> bool {
    let i = ranges.partition_point(|r| r.end <= at);
    ranges.get(i).is_some_and(|r| r.start <= at)
}

/// Result of one pass over brain output.
struct Scan {
    /// `(start, end)` byte positions (end inclusive) of every balanced
    /// `{...}` span, ordered by start.
    spans: Vec<(usize, usize)>,
    /// Byte ranges of JSON string literals, quotes included, in order.
    strings: Vec<Range<usize>>,
}

/// Single pass tracking open braces on a stack.
///
/// Quotes only open a string inside a brace, so apostrophes and stray quotes
/// in surrounding prose do not hide the object that follows.
fn scan(text: &str) -> Scan {
    let mut open = Vec::new();
    let mut spans = Vec::new();
    let mut strings = Vec::new();
    let mut string_start = None;
    let mut escape = false;
    for (index, ch) in text.char_indices() {
        if let Some(start) = string_start {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                strings.push(start..index + 1);
                string_start = None;
            }
            continue;
        }
        match ch {
            '"' if !open.is_empty() => string_start = Some(index),
            '{' => open.push(index),
            '}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, index));
                }
            }
            _ => {}
        }
    }
    if let Some(start) = string_start {
        strings.push(start..text.len());
    }
    spans.sort_unstable_by_key(|&(start, _)| start);
    Scan { spans, strings }
}

fn first_json_object(visible: &str, raw: &str) -> Result<Map<String, Value>, ParseError> {
    let mut first_decode_error = None;
    for (start, end) in scan(visible).spans {
        match serde_json::from_str::<Value>(&visible[start..=end]) {
            Ok(Value::Object(object)) => return Ok(object),
            Ok(_) => {}
            Err(err) => {
                first_decode_error.get_or_insert(err);
            }
        }
    }
    let message = match first_decode_error {
        Some(err) => format!("invalid JSON: {err}"),
        None => "no JSON object found".to_string(),
    };
    tracing::debug!(%message, "brain output not parseable");
    Err(ParseError::malformed(message, raw))
}

fn action_from_object(mut object: Map<String, Value>, raw: &str) -> Result<Action, ParseError> {
    let tool_name = match take_first(&mut object, &TOOL_KEYS) {
        None => return Err(ParseError::schema_violation("missing 'toolName' field", raw)),
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(Value::String(_)) => {
            return Err(ParseError::schema_violation("'toolName' is empty", raw));
        }
        Some(other) => {
            return Err(ParseError::schema_violation(
                format!("'toolName' must be a string, got {other}"),
                raw,
            ));
        }
    };

    let arguments = match take_first(&mut object, &ARGUMENT_KEYS) {
        Some(Value::Object(arguments)) => arguments,
        None => return Err(ParseError::schema_violation("missing 'arguments' field", raw)),
        Some(_) => {
            return Err(ParseError::schema_violation(
                "'arguments' must be a JSON object",
                raw,
            ));
        }
    };

    if tool_name == FINISH_TOOL {
        let has_answer = arguments
            .get("answer")
            .and_then(Value::as_str)
            .is_some_and(|a| !a.trim().is_empty());
        if !has_answer {
            return Err(ParseError::schema_violation(
                "finish requires a non-empty string 'answer'",
                raw,
            ));
        }
    }

    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);
    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));

    Ok(Action {
        tool_name,
        arguments,
        reasoning,
        confidence,
    })
}

fn take_first(object: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| object.remove(*key))
}
