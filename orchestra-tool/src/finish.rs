//! The built-in `finish` tool.

use async_trait::async_trait;
use orchestra_types::{
    CapabilityClass, CostClass, FINISH_TOOL, LatencyClass, ToolDescriptor, ToolKind,
};
use serde_json::{Value, json};

use crate::executor::{ToolError, ToolExecutor, ToolOutput};

/// Terminates a run. Validates the final answer and echoes it back as the
/// terminal payload `{answer, sources, confidence}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinishTool;

impl FinishTool {
    /// The descriptor every registry starts with.
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            FINISH_TOOL,
            "Finish the task and return the final answer to the user.",
            json!({
                "type": "object",
                "properties": {
                    "answer": {
                        "type": "string",
                        "description": "The final answer to the user's question"
                    },
                    "sources": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Sources consulted, if any"
                    },
                    "confidence": {
                        "type": "number",
                        "description": "Confidence in the answer, 0 to 1"
                    }
                },
                "required": ["answer"]
            }),
        )
        .with_cost(CostClass::Free)
        .with_latency(LatencyClass::Instant)
        .with_capability(CapabilityClass::Basic)
        .with_kind(ToolKind::Terminal)
    }
}

#[async_trait]
impl ToolExecutor for FinishTool {
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let answer = arguments
            .get("answer")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ToolError::InvalidInput("answer must be a non-empty string".into()))?;

        let sources: Vec<&str> = arguments
            .get("sources")
            .and_then(Value::as_array)
            .map(|s| s.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let confidence = arguments
            .get("confidence")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0));

        Ok(ToolOutput::new(json!({
            "answer": answer,
            "sources": sources,
            "confidence": confidence,
        })))
    }
}
