//! Runner configuration: a JSON file, then environment overrides.

use std::path::Path;
use std::time::Duration;

use orchestra_loop::LoopConfig;
use orchestra_route::RoutingPolicy;
use orchestra_types::PreferenceVector;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Local OpenAI-compatible server (LM Studio by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmStudioConfig {
    /// Base URL, up to and including `/v1`.
    pub base_url: String,
    /// Bearer token; local servers usually accept anything.
    pub api_key: Option<String>,
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".into(),
            api_key: None,
        }
    }
}

/// Model names and cloud credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// The brain that picks tools.
    pub orchestrator: String,
    /// Local sub-model exposed as `phi4`.
    pub phi4: String,
    /// Cloud sub-model exposed as `gemini`.
    pub gemini: String,
    /// Gemini key; without one the `gemini` tool is not registered.
    pub gemini_api_key: Option<String>,
    /// Gemini's OpenAI-compatible endpoint.
    pub gemini_base_url: String,
    /// Gemini price per million input tokens.
    pub gemini_input_per_million: Decimal,
    /// Gemini price per million output tokens.
    pub gemini_output_per_million: Decimal,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            orchestrator: "nemotron-orchestrator-8b".into(),
            phi4: "microsoft_phi-4-mini-instruct".into(),
            gemini: "gemini-2.0-flash-exp".into(),
            gemini_api_key: None,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
            gemini_input_per_million: Decimal::new(10, 2),
            gemini_output_per_million: Decimal::new(40, 2),
        }
    }
}

/// Brave Search credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BraveConfig {
    /// Subscription token; without one `web_search` is hidden.
    pub api_key: Option<String>,
    /// Search endpoint.
    pub base_url: String,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: orchestra_tools::BRAVE_SEARCH_URL.into(),
        }
    }
}

/// Preference values used when the command line names none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceDefaults {
    /// 0 = minimize cost, 1 = best quality regardless of cost.
    pub budget: f64,
    /// Local tools only.
    pub privacy: bool,
    /// Preference for fast tools.
    pub speed: f64,
    /// Preference for capable tools.
    pub quality: f64,
}

impl Default for PreferenceDefaults {
    fn default() -> Self {
        Self {
            budget: 0.5,
            privacy: false,
            speed: 0.5,
            quality: 0.5,
        }
    }
}

/// Everything the runner needs to compose a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestraConfig {
    /// Local model server.
    pub lm_studio: LmStudioConfig,
    /// Model names and cloud credentials.
    pub models: ModelsConfig,
    /// Web search credentials.
    pub brave: BraveConfig,
    /// Default preference vector.
    pub defaults: PreferenceDefaults,
    /// Advisory routing thresholds.
    pub routing: RoutingPolicy,
    /// Turn ceiling.
    pub max_iterations: u32,
    /// Seconds allowed for one brain call.
    pub brain_timeout_secs: u64,
    /// Seconds allowed for one tool call.
    pub tool_timeout_secs: u64,
    /// Consecutive malformed brain outputs tolerated.
    pub max_parse_failures: u32,
    /// Interpreter used by `python_sandbox`.
    pub python_interpreter: String,
    /// Ask the brain for JSON-only output.
    pub json_mode: bool,
    /// Sampling temperature for the brain.
    pub temperature: Option<f64>,
}

impl Default for OrchestraConfig {
    fn default() -> Self {
        let loop_defaults = LoopConfig::default();
        Self {
            lm_studio: LmStudioConfig::default(),
            models: ModelsConfig::default(),
            brave: BraveConfig::default(),
            defaults: PreferenceDefaults::default(),
            routing: RoutingPolicy::default(),
            max_iterations: loop_defaults.max_turns,
            brain_timeout_secs: loop_defaults.brain_timeout.as_secs(),
            tool_timeout_secs: loop_defaults.tool_timeout.as_secs(),
            max_parse_failures: loop_defaults.max_parse_failures,
            python_interpreter: "python3".into(),
            json_mode: false,
            temperature: None,
        }
    }
}

impl OrchestraConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            CliError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self, CliError> {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`. Empty values are ignored.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("LM_STUDIO_BASE_URL") {
            self.lm_studio.base_url = v;
        }
        if let Some(v) = get("LM_STUDIO_API_KEY") {
            self.lm_studio.api_key = Some(v);
        }
        if let Some(v) = get("ORCHESTRATOR_MODEL") {
            self.models.orchestrator = v;
        }
        if let Some(v) = get("PHI4_MODEL") {
            self.models.phi4 = v;
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.models.gemini = v;
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.models.gemini_api_key = Some(v);
        }
        if let Some(v) = get("BRAVE_API_KEY") {
            self.brave.api_key = Some(v);
        }
        if let Some(v) = get("BRAVE_BASE_URL") {
            self.brave.base_url = v;
        }
        if let Some(v) = get("MAX_ITERATIONS") {
            self.max_iterations = parse_number("MAX_ITERATIONS", &v)?;
        }
        if let Some(v) = get("DEFAULT_BUDGET") {
            self.defaults.budget = parse_number("DEFAULT_BUDGET", &v)?;
        }
        if let Some(v) = get("DEFAULT_PRIVACY") {
            self.defaults.privacy = parse_bool("DEFAULT_PRIVACY", &v)?;
        }
        if let Some(v) = get("DEFAULT_SPEED") {
            self.defaults.speed = parse_number("DEFAULT_SPEED", &v)?;
        }
        if let Some(v) = get("DEFAULT_QUALITY") {
            self.defaults.quality = parse_number("DEFAULT_QUALITY", &v)?;
        }
        Ok(self)
    }

    /// The default preference vector, validated.
    pub fn preferences(&self) -> Result<PreferenceVector, CliError> {
        let d = &self.defaults;
        Ok(PreferenceVector::new(d.budget, d.privacy, d.speed, d.quality)?)
    }

    /// Loop knobs derived from this config, validated.
    pub fn loop_config(&self) -> Result<LoopConfig, CliError> {
        let config = LoopConfig {
            max_turns: self.max_iterations,
            brain_timeout: Duration::from_secs(self.brain_timeout_secs),
            tool_timeout: Duration::from_secs(self.tool_timeout_secs),
            max_parse_failures: self.max_parse_failures,
            response_format: if self.json_mode {
                orchestra_turn::ResponseFormat::JsonObject
            } else {
                orchestra_turn::ResponseFormat::Text
            },
            temperature: self.temperature,
            ..LoopConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CliError> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("{key} is not a valid number: {value}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CliError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CliError::Config(format!("{key} is not a boolean: {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = OrchestraConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.lm_studio.base_url, "http://localhost:1234/v1");
        assert_eq!(config.models.orchestrator, "nemotron-orchestrator-8b");
        assert_eq!(config.preferences().unwrap(), PreferenceVector::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let config = OrchestraConfig::default()
            .with_env_lookup(env(&[
                ("LM_STUDIO_BASE_URL", "http://10.0.0.2:1234/v1"),
                ("ORCHESTRATOR_MODEL", "orchestrator-q4"),
                ("BRAVE_API_KEY", "brave-key"),
                ("MAX_ITERATIONS", "4"),
                ("DEFAULT_BUDGET", "0.2"),
                ("DEFAULT_PRIVACY", "TRUE"),
            ]))
            .unwrap();
        assert_eq!(config.lm_studio.base_url, "http://10.0.0.2:1234/v1");
        assert_eq!(config.models.orchestrator, "orchestrator-q4");
        assert_eq!(config.brave.api_key.as_deref(), Some("brave-key"));
        assert_eq!(config.max_iterations, 4);
        let prefs = config.preferences().unwrap();
        assert_eq!(prefs.budget(), 0.2);
        assert!(prefs.privacy());
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let config = OrchestraConfig::default()
            .with_env_lookup(env(&[("GEMINI_API_KEY", ""), ("MAX_ITERATIONS", " ")]))
            .unwrap();
        assert!(config.models.gemini_api_key.is_none());
        assert_eq!(config.max_iterations, 10);
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let err = OrchestraConfig::default()
            .with_env_lookup(env(&[("MAX_ITERATIONS", "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_ITERATIONS"));

        let err = OrchestraConfig::default()
            .with_env_lookup(env(&[("DEFAULT_PRIVACY", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("DEFAULT_PRIVACY"));
    }

    #[test]
    fn out_of_range_preferences_fail_validation() {
        let config = OrchestraConfig::default()
            .with_env_lookup(env(&[("DEFAULT_QUALITY", "1.5")]))
            .unwrap();
        assert!(matches!(config.preferences(), Err(CliError::Preference(_))));
    }

    #[test]
    fn loop_config_reflects_limits() {
        let config = OrchestraConfig {
            max_iterations: 3,
            tool_timeout_secs: 5,
            json_mode: true,
            ..OrchestraConfig::default()
        };
        let loop_config = config.loop_config().unwrap();
        assert_eq!(loop_config.max_turns, 3);
        assert_eq!(loop_config.tool_timeout, Duration::from_secs(5));
        assert_eq!(
            loop_config.response_format,
            orchestra_turn::ResponseFormat::JsonObject
        );

        let zero = OrchestraConfig {
            max_iterations: 0,
            ..OrchestraConfig::default()
        };
        assert!(matches!(zero.loop_config(), Err(CliError::Loop(_))));
    }
}
