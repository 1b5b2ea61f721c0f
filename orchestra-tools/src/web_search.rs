//! `web_search`: the Brave Search web API.

use std::time::Duration;

use async_trait::async_trait;
use orchestra_tool::{ToolError, ToolExecutor, ToolOutput};
use orchestra_types::{CapabilityClass, CostClass, Decimal, LatencyClass, ToolDescriptor, ToolKind};
use serde::Deserialize;
use serde_json::{Value, json};

/// Brave Search web endpoint.
pub const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

const DEFAULT_RESULTS: u64 = 5;
const MAX_RESULTS: u64 = 20;

/// Searches the public web through Brave Search.
///
/// Without an API key the tool reports itself unavailable, so the registry
/// hides it from the brain.
pub struct WebSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    cost_per_query: Decimal,
    timeout: Duration,
}

impl WebSearch {
    /// Registry name.
    pub const NAME: &'static str = "web_search";

    /// Create the tool. An empty key counts as no key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: BRAVE_SEARCH_URL.into(),
            cost_per_query: Decimal::new(1, 3),
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Cost reported for each successful query.
    pub fn with_cost_per_query(mut self, cost: Decimal) -> Self {
        self.cost_per_query = cost;
        self
    }

    /// HTTP timeout for one query.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// External, low cost, retrieval.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            "Searches the public internet for real-time information. Use for \
             current events, documentation, or information not in local knowledge. \
             Disabled in privacy mode.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "num_results": {
                        "type": "integer",
                        "description": "Number of results to return (default: 5)"
                    }
                },
                "required": ["query"]
            }),
        )
        .external()
        .with_cost(CostClass::Low)
        .with_latency(LatencyClass::Moderate)
        .with_capability(CapabilityClass::Standard)
        .with_kind(ToolKind::Retrieval)
    }
}

#[derive(Debug, Default, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Default, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
}

fn summarize(query: &str, response: BraveResponse, limit: usize) -> Value {
    let results: Vec<Value> = response
        .web
        .unwrap_or_default()
        .results
        .into_iter()
        .take(limit)
        .map(|r| {
            json!({
                "title": r.title,
                "snippet": r.description,
                "url": r.url,
            })
        })
        .collect();
    json!({
        "query": query,
        "total_results": results.len(),
        "results": results,
    })
}

#[async_trait]
impl ToolExecutor for WebSearch {
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::Unavailable("BRAVE_API_KEY is not configured".into()))?;
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidInput("query must be a non-empty string".into()))?;
        let count = arguments
            .get("num_results")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_RESULTS)
            .clamp(1, MAX_RESULTS);

        let http_response = self
            .client
            .get(&self.base_url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .query(&[("q", query.to_string()), ("count", count.to_string())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "brave search request failed");
                ToolError::ExecutionFailed(format!("Brave Search request failed: {e}"))
            })?;

        let status = http_response.status();
        if !status.is_success() {
            tracing::warn!(%status, "brave search returned an error");
            return Err(ToolError::ExecutionFailed(format!(
                "Brave Search API error: {status}"
            )));
        }

        let body: BraveResponse = http_response.json().await.map_err(|e| {
            ToolError::ExecutionFailed(format!("Brave Search returned invalid JSON: {e}"))
        })?;
        let output = summarize(query, body, count as usize);
        tracing::debug!(query, results = %output["total_results"], "web search finished");

        Ok(ToolOutput::new(output).with_cost(self.cost_per_query))
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}
