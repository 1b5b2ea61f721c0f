//! Composition through the umbrella crate's prelude.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use orchestra::orchestra_types::is_well_formed;
use orchestra::prelude::*;
use serde_json::{Value, json};

/// Looks up the query it is asked about, then finishes with what it found.
struct TwoStepBrain {
    calls: AtomicUsize,
}

impl BrainClient for TwoStepBrain {
    fn complete(
        &self,
        request: BrainRequest,
    ) -> impl Future<Output = Result<BrainResponse, BrainError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // The first message is the query; any later message is an observation.
        let query = request
            .messages
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let reply = if request.messages.len() == 1 {
            json!({"toolName": "lookup", "arguments": {"key": query}}).to_string()
        } else {
            let observed = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            json!({
                "toolName": "finish",
                "arguments": {"answer": observed, "sources": ["lookup"]}
            })
            .to_string()
        };
        async move { Ok(BrainResponse::text(reply)) }
    }
}

struct Lookup;

#[async_trait]
impl ToolExecutor for Lookup {
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let key = arguments["key"].as_str().unwrap_or_default();
        Ok(ToolOutput::text(format!("value of {key}")).with_cost(Decimal::new(1, 2)))
    }
}

fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry
        .register(
            ToolDescriptor::new(
                "lookup",
                "Look a key up",
                json!({
                    "type": "object",
                    "properties": {"key": {"type": "string"}},
                    "required": ["key"]
                }),
            )
            .with_kind(ToolKind::Retrieval),
            Arc::new(Lookup),
        )
        .unwrap();
    Arc::new(registry)
}

#[tokio::test]
async fn prelude_composes_a_working_loop() {
    let brain = TwoStepBrain {
        calls: AtomicUsize::new(0),
    };
    let execution = ExecutionLoop::new(brain, registry(), LoopConfig::default()).unwrap();

    let result = execution
        .run_query("alpha", &PreferenceVector::default(), 5)
        .await;

    assert_eq!(result.termination, TerminationReason::Finished);
    assert!(result.answer.contains("value of alpha"));
    assert_eq!(result.sources, ["lookup"]);
    assert_eq!(result.cost, Decimal::new(1, 2));
    assert_eq!(result.turns, 2);
    assert!(is_well_formed(&result.trace));
}

#[tokio::test]
async fn one_loop_serves_concurrent_queries() {
    let brain = TwoStepBrain {
        calls: AtomicUsize::new(0),
    };
    let execution = ExecutionLoop::new(brain, registry(), LoopConfig::default()).unwrap();
    let prefs = PreferenceVector::default();

    let (a, b) = tokio::join!(
        execution.run_query("alpha", &prefs, 5),
        execution.run_query("beta", &prefs, 5),
    );

    assert!(a.answer.contains("value of alpha"));
    assert!(b.answer.contains("value of beta"));
    assert!(!a.answer.contains("beta"));
    assert!(is_well_formed(&a.trace) && is_well_formed(&b.trace));
}
