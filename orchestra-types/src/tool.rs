//! Tool descriptors and the ordinal hints the routing policy reads.

use serde::{Deserialize, Serialize};

/// Marginal cost of one call, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostClass {
    /// No marginal cost (local execution, free tiers).
    Free,
    /// Fractions of a cent per call.
    Low,
    /// Around a cent per call.
    Medium,
    /// Noticeably expensive per call.
    High,
}

/// Typical wall-clock latency, fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyClass {
    /// Effectively immediate.
    Instant,
    /// Well under a second.
    Fast,
    /// A few seconds.
    Moderate,
    /// Tens of seconds.
    Slow,
}

/// How capable a tool is at open-ended work, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityClass {
    /// Narrow, mechanical capability.
    Basic,
    /// General-purpose capability.
    Standard,
    /// Frontier models and premium services.
    Advanced,
}

/// What a tool is for. Used to render the multi-step directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Looks information up (web search, document retrieval).
    Retrieval,
    /// Computes (code execution, calculators).
    Computation,
    /// A sub-model exposed as a tool.
    Model,
    /// Ends the run.
    Terminal,
    /// Anything else.
    Other,
}

/// Everything the registry and the policy know about a tool, minus its
/// executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique registry key.
    pub name: String,
    /// Human-readable description shown to the brain.
    pub description: String,
    /// JSON Schema object describing the arguments.
    pub parameter_schema: serde_json::Value,
    /// Runs on this machine with zero marginal cost and no data egress.
    pub is_local: bool,
    /// Ordinal cost hint.
    pub cost_class: CostClass,
    /// Ordinal latency hint.
    pub latency_class: LatencyClass,
    /// Ordinal capability hint.
    pub capability: CapabilityClass,
    /// Role of the tool in a multi-step plan.
    pub kind: ToolKind,
}

impl ToolDescriptor {
    /// A local, free, fast, standard-capability tool of kind `Other`.
    ///
    /// Adjust with the builder methods.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema,
            is_local: true,
            cost_class: CostClass::Free,
            latency_class: LatencyClass::Fast,
            capability: CapabilityClass::Standard,
            kind: ToolKind::Other,
        }
    }

    /// Mark the tool as calling an external service.
    #[must_use]
    pub fn external(mut self) -> Self {
        self.is_local = false;
        self
    }

    /// Set the cost class.
    #[must_use]
    pub fn with_cost(mut self, cost: CostClass) -> Self {
        self.cost_class = cost;
        self
    }

    /// Set the latency class.
    #[must_use]
    pub fn with_latency(mut self, latency: LatencyClass) -> Self {
        self.latency_class = latency;
        self
    }

    /// Set the capability class.
    #[must_use]
    pub fn with_capability(mut self, capability: CapabilityClass) -> Self {
        self.capability = capability;
        self
    }

    /// Set the tool kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ToolKind) -> Self {
        self.kind = kind;
        self
    }

    /// True when a call costs nothing: local tools and free external ones.
    pub fn is_zero_cost(&self) -> bool {
        self.is_local || self.cost_class == CostClass::Free
    }

    /// Names of the parameters the schema marks as required.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameter_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|fields| fields.iter().filter_map(|f| f.as_str()).collect())
            .unwrap_or_default()
    }
}
