//! Terminal artifact of a run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::Turn;

/// Why a run stopped without a valid finish action.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoopError {
    /// The brain kept producing unparseable output.
    #[error("brain produced {failures} consecutive malformed outputs")]
    RepeatedMalformedOutput {
        /// Consecutive failures observed.
        failures: u32,
    },
    /// The turn ceiling was reached before a finish action.
    #[error("max turns reached ({max_turns})")]
    MaxTurnsExceeded {
        /// The configured ceiling.
        max_turns: u32,
    },
    /// The caller cancelled the run.
    #[error("cancelled")]
    Cancelled,
    /// The brain failed in a way retrying will not fix.
    #[error("brain error: {message}")]
    Brain {
        /// Error detail.
        message: String,
    },
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A valid finish action was received.
    Finished,
    /// The turn ceiling was reached.
    MaxTurnsExceeded,
    /// A non-recoverable condition stopped the run.
    FatalError,
    /// The caller cancelled the run.
    Cancelled,
}

impl LoopError {
    /// The termination reason this error maps to.
    pub fn termination(&self) -> TerminationReason {
        match self {
            LoopError::MaxTurnsExceeded { .. } => TerminationReason::MaxTurnsExceeded,
            LoopError::Cancelled => TerminationReason::Cancelled,
            LoopError::RepeatedMalformedOutput { .. } | LoopError::Brain { .. } => {
                TerminationReason::FatalError
            }
        }
    }
}

/// Everything the caller gets back from a run. Always produced, even on
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopResult {
    /// Final answer, or the best partial answer the trace supports.
    pub answer: String,
    /// Sources cited by the finish action (or tools used, on failure).
    pub sources: Vec<String>,
    /// Full turn history.
    pub trace: Vec<Turn>,
    /// How the run ended.
    pub termination: TerminationReason,
    /// The loop error, for every termination other than `Finished`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<LoopError>,
    /// Brain plus tool cost.
    pub cost: Decimal,
    /// Brain calls made.
    pub turns: u32,
    /// Confidence reported by the finish action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl LoopResult {
    /// Whether the run ended with a valid finish action.
    pub fn is_finished(&self) -> bool {
        self.termination == TerminationReason::Finished
    }
}
