//! Chat Completions request/response types.
//!
//! Only the fields the orchestrator uses are modelled. Unknown response
//! fields are ignored, so LM Studio, vLLM and hosted endpoints all decode.

use serde::{Deserialize, Serialize};

/// `POST {base}/chat/completions` request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages, system message first.
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Output format constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ChatResponseFormat>,
    /// Always `false`.
    pub stream: bool,
}

/// A chat message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    /// Message text. Some servers send `null` for empty replies.
    #[serde(default)]
    pub content: Option<String>,
}

/// `response_format` object.
#[derive(Debug, Serialize)]
pub struct ChatResponseFormat {
    /// "json_object".
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Chat Completions response body.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model that answered.
    #[serde(default)]
    pub model: String,
    /// Completion choices; only the first is used.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Token accounting, absent on some local servers.
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message.
    pub message: ChatMessage,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage block.
#[derive(Debug, Default, Deserialize)]
pub struct ChatUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u64,
}
