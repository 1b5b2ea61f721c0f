//! Sub-models exposed as tools.

use async_trait::async_trait;
use orchestra_tool::{ToolError, ToolExecutor, ToolOutput};
use orchestra_turn::{BrainClient, BrainError, BrainRequest};
use orchestra_types::{CapabilityClass, CostClass, LatencyClass, ToolDescriptor, ToolKind};
use serde_json::{Value, json};

const DEFAULT_MAX_TOKENS: u32 = 2048;

/// A [`BrainClient`] wrapped as a tool taking `{prompt, system_prompt?, max_tokens?}`.
///
/// The descriptor decides where the model sits in routing: [`phi4`](Self::phi4)
/// is local and free, [`gemini`](Self::gemini) is a paid cloud model.
pub struct ModelTool<B> {
    descriptor: ToolDescriptor,
    client: B,
}

impl<B: BrainClient> ModelTool<B> {
    /// Wrap `client` under a custom descriptor.
    pub fn new(descriptor: ToolDescriptor, client: B) -> Self {
        Self { descriptor, client }
    }

    /// Local Phi-4 served by LM Studio.
    pub fn phi4(client: B) -> Self {
        let descriptor = ToolDescriptor::new(
            "phi4",
            "Local Phi-4 language model for code generation, summarization, query \
             formulation, and general reasoning. Fast and free. Use for: writing code, \
             drafting queries, summarizing results, simple reasoning tasks.",
            prompt_schema(),
        )
        .with_cost(CostClass::Free)
        .with_latency(LatencyClass::Moderate)
        .with_capability(CapabilityClass::Standard)
        .with_kind(ToolKind::Model);
        Self::new(descriptor, client)
    }

    /// Google Gemini in the cloud.
    pub fn gemini(client: B) -> Self {
        let descriptor = ToolDescriptor::new(
            "gemini",
            "Google Gemini cloud model for complex reasoning, advanced analysis, and \
             high-quality responses. Paid API: use when local models are insufficient. \
             Best for multi-step reasoning, complex analysis, and synthesis of complex \
             information.",
            prompt_schema(),
        )
        .external()
        .with_cost(CostClass::Low)
        .with_latency(LatencyClass::Moderate)
        .with_capability(CapabilityClass::Advanced)
        .with_kind(ToolKind::Model);
        Self::new(descriptor, client)
    }

    /// Descriptor to register the tool under.
    pub fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    /// The wrapped client.
    pub fn client(&self) -> &B {
        &self.client
    }
}

fn prompt_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "description": "The prompt/instruction for the model"
            },
            "system_prompt": {
                "type": "string",
                "description": "Optional system prompt to set context"
            },
            "max_tokens": {
                "type": "integer",
                "description": "Maximum tokens to generate (default: 2048)"
            }
        },
        "required": ["prompt"]
    })
}

#[async_trait]
impl<B: BrainClient + 'static> ToolExecutor for ModelTool<B> {
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let name = &self.descriptor.name;
        let prompt = arguments
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidInput("prompt must be a non-empty string".into()))?;
        let max_tokens = arguments
            .get("max_tokens")
            .and_then(Value::as_u64)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let mut request = BrainRequest::prompt(prompt);
        request.system = arguments
            .get("system_prompt")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        request.max_tokens = Some(max_tokens);

        let response = self.client.complete(request).await.map_err(|err| match err {
            BrainError::AuthFailed(msg) => {
                ToolError::Unavailable(format!("{name} rejected credentials: {msg}"))
            }
            BrainError::ModelNotFound(msg) => {
                ToolError::Unavailable(format!("{name} model is not loaded: {msg}"))
            }
            other => ToolError::ExecutionFailed(format!("{name} call failed: {other}")),
        })?;
        tracing::debug!(
            tool = %name,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            cost = %response.cost,
            "model tool answered"
        );

        Ok(ToolOutput::text(response.text).with_cost(response.cost))
    }
}
