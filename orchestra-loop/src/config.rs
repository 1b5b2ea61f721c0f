//! Configuration for the execution loop.

use std::time::Duration;

use orchestra_turn::{DEFAULT_SYSTEM_PROMPT, ResponseFormat};
use thiserror::Error;

/// A [`LoopConfig`] that cannot drive a run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_turns` is zero.
    #[error("max_turns must be at least 1")]
    ZeroMaxTurns,
    /// A timeout is zero.
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    /// `max_observation_chars` is zero.
    #[error("max_observation_chars must be at least 1")]
    ZeroObservationChars,
}

/// Knobs of the execution loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Turn ceiling used by [`run`](crate::ExecutionLoop::run).
    pub max_turns: u32,
    /// Deadline for one brain call.
    pub brain_timeout: Duration,
    /// Deadline for one tool dispatch.
    pub tool_timeout: Duration,
    /// Consecutive unparseable outputs tolerated. One more is fatal.
    pub max_parse_failures: u32,
    /// Base instructions; tools and directive are appended each turn.
    pub system_prompt: String,
    /// Observation text beyond this many chars is truncated for the brain.
    pub max_observation_chars: usize,
    /// Output format hint passed to the brain.
    pub response_format: ResponseFormat,
    /// Maximum output tokens per brain call.
    pub max_tokens: Option<u32>,
    /// Sampling temperature for brain calls.
    pub temperature: Option<f64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            brain_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(60),
            max_parse_failures: 3,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_observation_chars: 8_000,
            response_format: ResponseFormat::Text,
            max_tokens: None,
            temperature: None,
        }
    }
}

impl LoopConfig {
    /// Reject values that would make every run fail or hang.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::ZeroMaxTurns);
        }
        if self.brain_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("brain_timeout"));
        }
        if self.tool_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("tool_timeout"));
        }
        if self.max_observation_chars == 0 {
            return Err(ConfigError::ZeroObservationChars);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LoopConfig::default();
        assert_eq!(config.max_turns, 10);
        assert_eq!(config.brain_timeout, Duration::from_secs(120));
        assert_eq!(config.tool_timeout, Duration::from_secs(60));
        assert_eq!(config.max_parse_failures, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        let config = LoopConfig {
            max_turns: 0,
            ..LoopConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxTurns));

        let config = LoopConfig {
            tool_timeout: Duration::ZERO,
            ..LoopConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "tool_timeout must be greater than zero"
        );

        let config = LoopConfig {
            brain_timeout: Duration::ZERO,
            ..LoopConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout("brain_timeout")));
    }
}
