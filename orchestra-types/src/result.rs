//! Results of dispatched (or refused) actions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification of a failed observation.
///
/// Tool-side kinds come from the registry; the rest are produced by the
/// loop when it refuses an action or the brain misbehaves. All of them are
/// shown to the brain so it can adapt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The brain's output held no decodable action object.
    Malformed,
    /// An action object was found but lacks required fields.
    SchemaViolation,
    /// The chosen tool is not eligible under the current preferences.
    PolicyViolation,
    /// The chosen tool is not registered.
    NotFound,
    /// Arguments did not match the tool's parameter schema.
    Validation,
    /// The executor failed.
    Execution,
    /// The tool or the brain did not answer in time.
    Timeout,
    /// The brain call failed before producing output.
    BrainFailure,
}

/// Error payload of a failed [`ToolResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable detail, shown to the brain.
    pub message: String,
}

/// Outcome of one dispatch.
///
/// `error` is `Some` exactly when the call failed; [`ToolResult::success`]
/// is derived from it, so the two cannot disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Structured or text payload. `Null` on failure.
    pub output: serde_json::Value,
    /// Failure detail, present iff the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
    /// Money spent by this call. Zero for local tools.
    pub cost_incurred: Decimal,
    /// Wall-clock time of the call in milliseconds.
    pub latency_ms: u64,
}

impl ToolResult {
    /// A successful result with zero cost and latency.
    pub fn ok(output: serde_json::Value) -> Self {
        Self {
            output,
            error: None,
            cost_incurred: Decimal::ZERO,
            latency_ms: 0,
        }
    }

    /// A failed result with zero cost and latency.
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            output: serde_json::Value::Null,
            error: Some(ToolFailure {
                kind,
                message: message.into(),
            }),
            cost_incurred: Decimal::ZERO,
            latency_ms: 0,
        }
    }

    /// Set the cost of the call.
    #[must_use]
    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost_incurred = cost;
        self
    }

    /// Set the measured latency.
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Whether the call succeeded.
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Kind of failure, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// The payload rendered as text: strings verbatim, everything else as
    /// pretty JSON, failures as their message.
    pub fn output_text(&self) -> String {
        match (&self.error, &self.output) {
            (Some(err), _) => err.message.clone(),
            (None, serde_json::Value::String(s)) => s.clone(),
            (None, serde_json::Value::Null) => String::new(),
            (None, other) => serde_json::to_string_pretty(other).unwrap_or_default(),
        }
    }
}
