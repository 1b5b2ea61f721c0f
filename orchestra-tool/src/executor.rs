//! The capability interface every tool implements.

use async_trait::async_trait;
use orchestra_types::Decimal;
use thiserror::Error;

/// Errors an executor may report. The registry folds them into a failed
/// `ToolResult`; they never reach the loop as Rust errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The arguments passed schema validation but are still unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The tool ran and failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// The tool cannot run in this process (missing credentials, binary).
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Catch-all for errors from underlying libraries.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// What an executor returns on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Structured or text payload.
    pub output: serde_json::Value,
    /// Money spent producing it.
    pub cost: Decimal,
}

impl ToolOutput {
    /// A zero-cost output.
    pub fn new(output: serde_json::Value) -> Self {
        Self {
            output,
            cost: Decimal::ZERO,
        }
    }

    /// A plain-text zero-cost output.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(serde_json::Value::String(text.into()))
    }

    /// Set the cost.
    #[must_use]
    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = cost;
        self
    }
}

/// A tool implementation.
///
/// Object-safe so the registry can hold heterogeneous executors behind
/// `Arc<dyn ToolExecutor>`. Arguments have already been checked against the
/// descriptor's schema when `execute` runs.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run the tool.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError>;

    /// Whether the tool can currently run. Unavailable tools are hidden from
    /// the brain.
    fn is_available(&self) -> bool {
        true
    }
}
