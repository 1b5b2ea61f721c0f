//! Request and response types shared by every brain client.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions).
    System,
    /// User message.
    User,
    /// Assistant (model) message.
    Assistant,
}

/// One text message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainMessage {
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl BrainMessage {
    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Output format hint. Clients that cannot honor it ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free text.
    #[default]
    Text,
    /// A single JSON object.
    JsonObject,
}

/// Request sent to a brain client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainRequest {
    /// Model to use (None = client default).
    pub model: Option<String>,
    /// System prompt.
    pub system: Option<String>,
    /// Conversation messages, oldest first.
    pub messages: Vec<BrainMessage>,
    /// Output format hint.
    #[serde(default)]
    pub response_format: ResponseFormat,
    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
}

impl BrainRequest {
    /// A request with a system prompt and messages, everything else default.
    pub fn new(system: impl Into<String>, messages: Vec<BrainMessage>) -> Self {
        Self {
            model: None,
            system: Some(system.into()),
            messages,
            response_format: ResponseFormat::default(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// A single-prompt request with no system prompt.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            system: None,
            messages: vec![BrainMessage::user(prompt)],
            response_format: ResponseFormat::default(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Token usage from one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens generated.
    pub output_tokens: u64,
}

/// Response from a brain client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainResponse {
    /// Generated text.
    pub text: String,
    /// Token usage.
    pub usage: TokenUsage,
    /// Model that actually answered.
    pub model: String,
    /// Cost of the call. Zero for local models.
    pub cost: Decimal,
}

impl BrainResponse {
    /// A zero-cost response with no usage, handy for tests and local stubs.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: TokenUsage::default(),
            model: String::new(),
            cost: Decimal::ZERO,
        }
    }
}
