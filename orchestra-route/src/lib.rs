#![deny(missing_docs)]
//! Preference-driven routing.
//!
//! A [`RoutingPolicy`] turns a [`PreferenceVector`] and the tool registry
//! into a [`Routing`]: the tools the brain may call this turn, ranked, plus
//! a plain-language directive for the system prompt.
//!
//! Only privacy is a hard constraint. Budget, quality and speed reorder the
//! list and shape the directive; the brain remains free to pick any
//! eligible tool.

use std::cmp::Ordering;

use orchestra_tool::ToolRegistry;
use orchestra_types::{FINISH_TOOL, LatencyClass, PreferenceVector, ToolDescriptor, ToolKind};
use serde::{Deserialize, Serialize};

/// Most tools named per hint in the directive.
const HINT_TOOLS: usize = 3;

/// Eligible tools and guidance for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Routing {
    /// Eligible tools, ranked. `finish` is always last.
    pub tools: Vec<ToolDescriptor>,
    /// Advisory guidance for the brain.
    pub directive: String,
}

impl Routing {
    /// Whether `name` is among the eligible tools.
    pub fn allows(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }
}

/// Thresholds at which a preference starts to bias routing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingPolicy {
    /// Budget strictly below this favors zero-cost tools.
    pub budget_threshold: f64,
    /// Quality strictly above this favors more capable tools.
    pub quality_threshold: f64,
    /// Speed strictly above this favors low-latency tools.
    pub speed_threshold: f64,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            budget_threshold: 0.3,
            quality_threshold: 0.7,
            speed_threshold: 0.7,
        }
    }
}

impl RoutingPolicy {
    /// Hard eligibility: with privacy on, only local tools.
    pub fn is_eligible(&self, prefs: &PreferenceVector, tool: &ToolDescriptor) -> bool {
        tool.name == FINISH_TOOL || !prefs.privacy() || tool.is_local
    }

    /// Eligible available tools, ranked by the active biases, `finish` last.
    pub fn eligible_tools(
        &self,
        prefs: &PreferenceVector,
        registry: &ToolRegistry,
    ) -> Vec<ToolDescriptor> {
        let (mut tools, finish): (Vec<_>, Vec<_>) = registry
            .list_available(|t| self.is_eligible(prefs, t))
            .into_iter()
            .partition(|t| t.name != FINISH_TOOL);

        let biases = self.biases(prefs);
        if biases.any() {
            // Stable: registration order breaks ties.
            tools.sort_by(|a, b| biases.compare(a, b));
        }
        tools.extend(finish);
        tools
    }

    /// Eligible tools plus the directive for the system prompt.
    pub fn route(&self, prefs: &PreferenceVector, registry: &ToolRegistry) -> Routing {
        let tools = self.eligible_tools(prefs, registry);
        let directive = self.directive(prefs, &tools);
        tracing::debug!(
            eligible = tools.len(),
            privacy = prefs.privacy(),
            budget = prefs.budget(),
            quality = prefs.quality(),
            speed = prefs.speed(),
            "routed"
        );
        Routing { tools, directive }
    }

    fn biases(&self, prefs: &PreferenceVector) -> Biases {
        Biases {
            cost: prefs.budget() < self.budget_threshold,
            capability: prefs.quality() > self.quality_threshold,
            latency: prefs.speed() > self.speed_threshold,
        }
    }

    fn directive(&self, prefs: &PreferenceVector, tools: &[ToolDescriptor]) -> String {
        let mut lines = vec!["Work in steps: retrieve, then compute, then finish.".to_string()];

        let groups = [
            ("Retrieve with", ToolKind::Retrieval),
            ("Compute with", ToolKind::Computation),
            ("Reason with", ToolKind::Model),
        ];
        for (lead, kind) in groups {
            let names = names_where(tools, |t| t.kind == kind, usize::MAX);
            if !names.is_empty() {
                lines.push(format!("{lead}: {names}."));
            }
        }

        if prefs.privacy() {
            lines.push(
                "Privacy mode is on: only local tools are available. \
                 Do not send the query to external services."
                    .to_string(),
            );
        }

        let biases = self.biases(prefs);
        if biases.cost {
            let cheap = names_where(tools, |t| t.is_zero_cost(), HINT_TOOLS);
            if cheap.is_empty() {
                lines.push("Budget is tight: use as few paid calls as possible.".to_string());
            } else {
                lines.push(format!("Budget is tight: prefer free tools ({cheap})."));
            }
        }
        if biases.capability {
            let best = names_where(tools, |_| true, HINT_TOOLS);
            if !best.is_empty() {
                lines.push(format!(
                    "Quality matters most: prefer the most capable tools ({best})."
                ));
            }
        }
        if biases.latency {
            let fast = names_where(tools, |t| t.latency_class <= LatencyClass::Fast, HINT_TOOLS);
            if fast.is_empty() {
                lines.push("Speed matters: keep the number of steps small.".to_string());
            } else {
                lines.push(format!("Speed matters: prefer fast tools ({fast}) and few steps."));
            }
        }

        lines.push(format!("Call {FINISH_TOOL} with your answer as soon as you have it."));
        lines.join("\n")
    }
}

/// Comma-separated names of up to `limit` non-terminal tools matching `pred`,
/// in ranking order.
fn names_where<P>(tools: &[ToolDescriptor], pred: P, limit: usize) -> String
where
    P: Fn(&ToolDescriptor) -> bool,
{
    tools
        .iter()
        .filter(|t| t.kind != ToolKind::Terminal && t.name != FINISH_TOOL && pred(t))
        .take(limit)
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy)]
struct Biases {
    cost: bool,
    capability: bool,
    latency: bool,
}

impl Biases {
    fn any(self) -> bool {
        self.cost || self.capability || self.latency
    }

    /// Cost first, then capability, then latency.
    fn compare(self, a: &ToolDescriptor, b: &ToolDescriptor) -> Ordering {
        let mut ord = Ordering::Equal;
        if self.cost {
            ord = ord
                .then_with(|| a.is_zero_cost().cmp(&b.is_zero_cost()).reverse())
                .then_with(|| a.cost_class.cmp(&b.cost_class));
        }
        if self.capability {
            ord = ord
                .then_with(|| b.capability.cmp(&a.capability))
                // Cloud before local on equal capability.
                .then_with(|| a.is_local.cmp(&b.is_local));
        }
        if self.latency {
            ord = ord.then_with(|| a.latency_class.cmp(&b.latency_class));
        }
        ord
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_types::{CapabilityClass, CostClass};
    use serde_json::json;

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, name, json!({"type": "object"}))
    }

    #[test]
    fn cost_bias_puts_zero_cost_first() {
        let biases = Biases {
            cost: true,
            capability: false,
            latency: false,
        };
        let paid = tool("paid").external().with_cost(CostClass::Medium);
        let cheap = tool("cheap").external().with_cost(CostClass::Low);
        let local = tool("local").with_cost(CostClass::High);
        assert_eq!(biases.compare(&local, &paid), Ordering::Less);
        assert_eq!(biases.compare(&cheap, &paid), Ordering::Less);
        assert_eq!(biases.compare(&paid, &cheap), Ordering::Greater);
    }

    #[test]
    fn capability_bias_prefers_cloud_on_ties() {
        let biases = Biases {
            cost: false,
            capability: true,
            latency: false,
        };
        let cloud = tool("cloud").external().with_capability(CapabilityClass::Advanced);
        let local = tool("local").with_capability(CapabilityClass::Advanced);
        let basic = tool("basic").external().with_capability(CapabilityClass::Basic);
        assert_eq!(biases.compare(&cloud, &local), Ordering::Less);
        assert_eq!(biases.compare(&local, &basic), Ordering::Less);
    }

    #[test]
    fn cost_outranks_capability_when_both_fire() {
        let biases = Biases {
            cost: true,
            capability: true,
            latency: true,
        };
        let strong_paid = tool("strong")
            .external()
            .with_cost(CostClass::High)
            .with_capability(CapabilityClass::Advanced);
        let weak_free = tool("weak")
            .with_capability(CapabilityClass::Basic)
            .with_latency(LatencyClass::Slow);
        assert_eq!(biases.compare(&weak_free, &strong_paid), Ordering::Less);
    }

    #[test]
    fn defaults() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.budget_threshold, 0.3);
        assert_eq!(policy.quality_threshold, 0.7);
        assert_eq!(policy.speed_threshold, 0.7);
    }
}
