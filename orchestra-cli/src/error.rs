use orchestra_loop::ConfigError;
use orchestra_tool::RegistryError;
use orchestra_types::PreferenceError;
use thiserror::Error;

/// Errors surfaced by the runner before or after a run. A run itself
/// never fails: its problems are reported inside the `LoopResult`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad flags, environment values or config contents.
    #[error("config error: {0}")]
    Config(String),
    /// Reading the config file or stdin failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The config file or the report is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Preference values outside `[0, 1]`.
    #[error("invalid preferences: {0}")]
    Preference(#[from] PreferenceError),
    /// Loop limits that cannot drive a run.
    #[error("invalid loop config: {0}")]
    Loop(#[from] ConfigError),
    /// Two tools registered under one name.
    #[error("tool registry: {0}")]
    Registry(#[from] RegistryError),
}
