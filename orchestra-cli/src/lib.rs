#![deny(missing_docs)]
//! Composition root for the `orchestra` binary.
//!
//! Loads an [`OrchestraConfig`], registers the built-in tools, points an
//! [`OpenAiCompatible`] brain at the configured server and runs one query
//! through an [`ExecutionLoop`].

pub mod config;
mod error;

use std::fmt::Write as _;
use std::sync::Arc;

use orchestra_loop::{CancellationToken, ExecutionLoop};
use orchestra_provider_openai::{OpenAiCompatible, Pricing};
use orchestra_tool::ToolRegistry;
use orchestra_tools::{ModelTool, PythonSandbox, WebSearch};
use orchestra_turn::BrainClient;
use orchestra_types::{LoopResult, PreferenceVector};

pub use config::OrchestraConfig;
pub use error::CliError;

/// One invocation: the query plus per-run preference overrides.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// The user's question.
    pub prompt: String,
    /// Overrides the configured budget.
    pub budget: Option<f64>,
    /// Overrides the configured privacy flag.
    pub privacy: Option<bool>,
    /// Overrides the configured speed preference.
    pub speed: Option<f64>,
    /// Overrides the configured quality preference.
    pub quality: Option<f64>,
    /// Overrides the configured turn ceiling.
    pub max_turns: Option<u32>,
}

impl RunRequest {
    /// A request using the configured preferences.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Merge the overrides over `config`'s defaults and validate.
    pub fn preferences(&self, config: &OrchestraConfig) -> Result<PreferenceVector, CliError> {
        let d = &config.defaults;
        Ok(PreferenceVector::new(
            self.budget.unwrap_or(d.budget),
            self.privacy.unwrap_or(d.privacy),
            self.speed.unwrap_or(d.speed),
            self.quality.unwrap_or(d.quality),
        )?)
    }
}

fn local_client(config: &OrchestraConfig, model: &str) -> OpenAiCompatible {
    let client = OpenAiCompatible::new()
        .with_url(&config.lm_studio.base_url)
        .with_model(model);
    match &config.lm_studio.api_key {
        Some(key) => client.with_api_key(key),
        None => client,
    }
}

/// The orchestrator brain client.
pub fn brain_client(config: &OrchestraConfig) -> OpenAiCompatible {
    local_client(config, &config.models.orchestrator)
}

/// Register the built-in tools.
///
/// `python_sandbox`, `web_search` (hidden without a Brave key) and `phi4`
/// are always registered; `gemini` only when a Gemini key is configured.
pub fn build_registry(config: &OrchestraConfig) -> Result<ToolRegistry, CliError> {
    let mut registry = ToolRegistry::new();

    let python = PythonSandbox::new().with_interpreter(&config.python_interpreter);
    registry.register(python.descriptor(), Arc::new(python))?;

    let search = WebSearch::new(config.brave.api_key.clone()).with_url(&config.brave.base_url);
    registry.register(search.descriptor(), Arc::new(search))?;

    let phi4 = ModelTool::phi4(local_client(config, &config.models.phi4));
    registry.register(phi4.descriptor(), Arc::new(phi4))?;

    match &config.models.gemini_api_key {
        Some(key) => {
            let client = OpenAiCompatible::new()
                .with_url(&config.models.gemini_base_url)
                .with_api_key(key)
                .with_model(&config.models.gemini)
                .with_pricing(Pricing::new(
                    config.models.gemini_input_per_million,
                    config.models.gemini_output_per_million,
                ));
            let gemini = ModelTool::gemini(client);
            registry.register(gemini.descriptor(), Arc::new(gemini))?;
        }
        None => tracing::info!("GEMINI_API_KEY not set, gemini tool disabled"),
    }

    tracing::debug!(tools = ?registry.names().collect::<Vec<_>>(), "registry composed");
    Ok(registry)
}

/// Run `request` against the configured server and tools.
pub async fn run(
    config: &OrchestraConfig,
    request: &RunRequest,
    cancel: &CancellationToken,
) -> Result<LoopResult, CliError> {
    let registry = Arc::new(build_registry(config)?);
    run_with_brain(brain_client(config), registry, config, request, cancel).await
}

/// Run `request` with an explicit brain and registry.
pub async fn run_with_brain<B: BrainClient>(
    brain: B,
    registry: Arc<ToolRegistry>,
    config: &OrchestraConfig,
    request: &RunRequest,
    cancel: &CancellationToken,
) -> Result<LoopResult, CliError> {
    let prefs = request.preferences(config)?;
    let loop_config = config.loop_config()?;
    let max_turns = request.max_turns.unwrap_or(loop_config.max_turns);
    let execution = ExecutionLoop::new(brain, registry, loop_config)?.with_policy(config.routing);
    Ok(execution
        .run_query_with_cancel(&request.prompt, &prefs, max_turns, cancel)
        .await)
}

/// Human-readable summary, or the whole result as pretty JSON.
pub fn render_report(result: &LoopResult, json: bool) -> Result<String, CliError> {
    if json {
        return Ok(serde_json::to_string_pretty(result)?);
    }

    let mut out = String::new();
    out.push_str(result.answer.trim_end());
    out.push('\n');
    if !result.sources.is_empty() {
        out.push_str("\nSources:\n");
        for source in &result.sources {
            let _ = writeln!(out, "- {source}");
        }
    }
    let _ = write!(
        out,
        "\n[{:?}] turns: {} | cost: ${}",
        result.termination, result.turns, result.cost
    );
    if let Some(confidence) = result.confidence {
        let _ = write!(out, " | confidence: {confidence:.2}");
    }
    if let Some(error) = &result.error {
        let _ = write!(out, "\nerror: {error}");
    }
    Ok(out)
}
