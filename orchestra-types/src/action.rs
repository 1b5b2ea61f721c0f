//! The brain's structured decision.

use serde::{Deserialize, Serialize};

/// Name of the built-in pseudo-tool that ends a run.
pub const FINISH_TOOL: &str = "finish";

/// One decision: which tool to call and with what arguments.
///
/// Serialized with the wire names the brain is prompted with
/// (`toolName`, `arguments`, `reasoning`). The older `tool` /
/// `parameters` spellings are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Registry key of the tool to invoke.
    #[serde(rename = "toolName", alias = "tool", alias = "tool_name")]
    pub tool_name: String,
    /// Arguments keyed by parameter name.
    #[serde(alias = "parameters")]
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// Free-text rationale. Never used for control flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Self-reported confidence, clamped to `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Action {
    /// Build an action with no reasoning or confidence.
    pub fn new(
        tool_name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            reasoning: None,
            confidence: None,
        }
    }

    /// Whether this action ends the run.
    pub fn is_finish(&self) -> bool {
        self.tool_name == FINISH_TOOL
    }

    /// Arguments as a JSON object value, the shape executors receive.
    pub fn arguments_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.arguments.clone())
    }

    /// Compact JSON form, used when replaying the action to the brain.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"toolName\":\"{}\"}}", self.tool_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_legacy_field_names() {
        let a: Action = serde_json::from_value(json!({
            "tool": "web_search",
            "parameters": {"query": "rust"},
            "reasoning": "need facts"
        }))
        .unwrap();
        assert_eq!(a.tool_name, "web_search");
        assert_eq!(a.arguments["query"], "rust");
        assert!(!a.is_finish());
    }

    #[test]
    fn serializes_wire_names() {
        let mut args = serde_json::Map::new();
        args.insert("answer".into(), json!("42"));
        let v = serde_json::to_value(Action::new(FINISH_TOOL, args)).unwrap();
        assert_eq!(v["toolName"], "finish");
        assert_eq!(v["arguments"]["answer"], "42");
        assert!(v.get("reasoning").is_none());
    }
}
