#![deny(missing_docs)]
//! OpenAI-compatible chat completions client for orchestra.
//!
//! Implements [`orchestra_turn::BrainClient`] against any server exposing
//! `POST {base_url}/chat/completions`: LM Studio (the default, at
//! `http://localhost:1234/v1`), vLLM, or a hosted endpoint such as Gemini's
//! OpenAI compatibility layer. Local servers cost nothing; set a
//! [`Pricing`] to have cloud calls report their cost.

mod error;
mod types;

use std::time::Duration;

use orchestra_turn::{
    BrainClient, BrainError, BrainRequest, BrainResponse, ResponseFormat, Role, TokenUsage,
};
use rust_decimal::Decimal;
use types::*;

/// Default base URL (LM Studio's local server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";

/// Default orchestrator model name.
pub const DEFAULT_MODEL: &str = "nemotron-orchestrator-8b";

/// Price per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pricing {
    /// Price of one million prompt tokens.
    pub input_per_million: Decimal,
    /// Price of one million completion tokens.
    pub output_per_million: Decimal,
}

impl Pricing {
    /// Create a pricing entry.
    pub fn new(input_per_million: Decimal, output_per_million: Decimal) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// Cost of one call with the given usage.
    pub fn cost(&self, usage: TokenUsage) -> Decimal {
        let million = Decimal::from(1_000_000u32);
        (Decimal::from(usage.input_tokens) * self.input_per_million
            + Decimal::from(usage.output_tokens) * self.output_per_million)
            / million
    }
}

/// OpenAI-compatible brain client.
pub struct OpenAiCompatible {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    pricing: Pricing,
    timeout: Option<Duration>,
}

impl OpenAiCompatible {
    /// Create a client for the local LM Studio server and default model.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            model: DEFAULT_MODEL.into(),
            pricing: Pricing::default(),
            timeout: None,
        }
    }

    /// Override the base URL (everything before `/chat/completions`).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Model used when a request names none.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Per-token pricing used to compute [`BrainResponse::cost`].
    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// HTTP-level timeout for one call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The default model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, request: &BrainRequest) -> ChatRequest {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system".into(),
                content: Some(system.clone()),
            });
        }
        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: role_name(m.role).into(),
            content: Some(m.content.clone()),
        }));

        let response_format = match request.response_format {
            ResponseFormat::JsonObject => Some(ChatResponseFormat {
                format_type: "json_object".into(),
            }),
            ResponseFormat::Text => None,
        };

        ChatRequest {
            model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
            stream: false,
        }
    }

    fn parse_response(&self, response: ChatResponse) -> Result<BrainResponse, BrainError> {
        let usage = response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let Some(choice) = response.choices.into_iter().next() else {
            return Err(BrainError::EmptyCompletion {
                model: response.model,
            });
        };
        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!(model = %response.model, "completion truncated at max_tokens");
        }

        Ok(BrainResponse {
            text: choice.message.content.unwrap_or_default(),
            usage,
            model: response.model,
            cost: self.pricing.cost(usage),
        })
    }
}

impl Default for OpenAiCompatible {
    fn default() -> Self {
        Self::new()
    }
}

impl BrainClient for OpenAiCompatible {
    fn complete(
        &self,
        request: BrainRequest,
    ) -> impl std::future::Future<Output = Result<BrainResponse, BrainError>> + Send {
        let api_request = self.build_request(&request);
        let mut http_request = self.client.post(self.endpoint()).json(&api_request);
        if let Some(ref key) = self.api_key {
            http_request = http_request.bearer_auth(key);
        }
        if let Some(timeout) = self.timeout {
            http_request = http_request.timeout(timeout);
        }
        let model = api_request.model.clone();

        async move {
            tracing::debug!(
                model = %model,
                messages = api_request.messages.len(),
                "chat completion"
            );
            let http_response = http_request
                .send()
                .await
                .map_err(error::map_reqwest_error)?;

            let status = http_response.status();
            if !status.is_success() {
                let body = http_response.text().await.unwrap_or_default();
                return Err(error::map_http_status(status, &body));
            }

            let api_response: ChatResponse = http_response
                .json()
                .await
                .map_err(|e| BrainError::InvalidResponse(e.to_string()))?;

            self.parse_response(api_response)
        }
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}
