use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use orchestra_loop::{CancellationToken, ExecutionLoop, LoopConfig};
use orchestra_tool::{ToolError, ToolExecutor, ToolOutput, ToolRegistry};
use orchestra_turn::{BrainClient, BrainError, BrainRequest, BrainResponse, TokenUsage};
use orchestra_types::{
    CostClass, Decimal, ErrorKind, LoopError, ObservationSource, PreferenceVector,
    TerminationReason, ToolDescriptor, ToolKind, Turn, is_well_formed,
};
use serde_json::{Value, json};

// -- Mock brain --

enum Step {
    Reply(String),
    Fail(BrainError),
    Hang,
}

struct MockBrain {
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<String>,
    requests: Mutex<Vec<BrainRequest>>,
    call_count: AtomicUsize,
}

impl MockBrain {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Replies with `text` once the queue is empty.
    fn repeating(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::new(Vec::new())
        }
    }
}

impl BrainClient for MockBrain {
    fn complete(
        &self,
        request: BrainRequest,
    ) -> impl std::future::Future<Output = Result<BrainResponse, BrainError>> + Send {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone().map(Step::Reply))
            .expect("MockBrain: no more steps queued");
        async move {
            match step {
                Step::Reply(text) => Ok(BrainResponse {
                    text,
                    usage: TokenUsage::default(),
                    model: "mock".into(),
                    cost: Decimal::new(1, 3),
                }),
                Step::Fail(err) => Err(err),
                Step::Hang => std::future::pending().await,
            }
        }
    }
}

// -- Tools --

struct Counting {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl Counting {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: None,
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolExecutor for Counting {
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = arguments["text"].as_str().unwrap_or_default();
        Ok(ToolOutput::text(format!("echo: {text}")).with_cost(Decimal::new(5, 4)))
    }
}

fn echo_descriptor(name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        name,
        "Echo the text back",
        json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        }),
    )
    .with_kind(ToolKind::Computation)
}

struct Fixture {
    echo: Arc<Counting>,
    search: Arc<Counting>,
    registry: Arc<ToolRegistry>,
}

fn fixture() -> Fixture {
    fixture_with_echo(Counting::new())
}

fn fixture_with_echo(echo: Arc<Counting>) -> Fixture {
    let search = Counting::new();
    let mut registry = ToolRegistry::new();
    registry
        .register(echo_descriptor("echo"), echo.clone())
        .unwrap();
    registry
        .register(
            echo_descriptor("web_search")
                .external()
                .with_cost(CostClass::Low)
                .with_kind(ToolKind::Retrieval),
            search.clone(),
        )
        .unwrap();
    Fixture {
        echo,
        search,
        registry: Arc::new(registry),
    }
}

fn call(tool: &str, arguments: Value) -> Step {
    Step::Reply(json!({ "toolName": tool, "arguments": arguments }).to_string())
}

fn finish(answer: &str) -> Step {
    call("finish", json!({ "answer": answer, "sources": ["echo"] }))
}

fn build(
    brain: &Arc<MockBrain>,
    registry: &Arc<ToolRegistry>,
    config: LoopConfig,
) -> ExecutionLoop<Arc<MockBrain>> {
    ExecutionLoop::new(brain.clone(), registry.clone(), config).unwrap()
}

fn observation_sources(trace: &[Turn]) -> Vec<ObservationSource> {
    trace
        .iter()
        .filter_map(|t| match t {
            Turn::Observation(o) => Some(o.source.clone()),
            _ => None,
        })
        .collect()
}

fn observation_kinds(trace: &[Turn]) -> Vec<Option<ErrorKind>> {
    trace
        .iter()
        .filter_map(|t| match t {
            Turn::Observation(o) => Some(o.result.error_kind()),
            _ => None,
        })
        .collect()
}

// -- Tests --

#[tokio::test]
async fn tool_then_finish() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        Step::Reply(format!(
            "<think>I should echo first</think>Sure: {}",
            json!({"toolName": "echo", "arguments": {"text": "hi"}, "reasoning": "test"})
        )),
        finish("hi back"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("say hi", &PreferenceVector::default(), 10).await;

    assert_eq!(result.termination, TerminationReason::Finished);
    assert!(result.is_finished());
    assert_eq!(result.error, None);
    assert_eq!(result.answer, "hi back");
    assert_eq!(result.sources, ["echo"]);
    assert_eq!(result.turns, 2);
    assert_eq!(f.echo.calls(), 1);
    // Two brain calls at 0.001 plus one echo at 0.0005.
    assert_eq!(result.cost, Decimal::new(25, 4));
    assert!(is_well_formed(&result.trace));
    assert_eq!(result.trace.len(), 4);
    assert!(matches!(result.trace.last(), Some(Turn::AssistantAction(_))));
}

#[tokio::test]
async fn observations_are_replayed_to_the_brain() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        call("echo", json!({"text": "ping"})),
        finish("done"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());
    lp.run_query("q", &PreferenceVector::default(), 10).await;

    let requests = brain.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages.len(), 1);
    let second = &requests[1].messages;
    assert_eq!(second.len(), 3);
    assert_eq!(second[2].content, "[echo] Result:\necho: ping");
    let system = requests[0].system.as_deref().unwrap();
    assert!(system.contains("- echo: Echo the text back"));
    assert!(system.contains("retrieve, then compute, then finish"));
}

#[tokio::test]
async fn privacy_rejects_cloud_tools_without_dispatch() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        call("web_search", json!({"text": "secret"})),
        finish("kept it local"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());
    let prefs = PreferenceVector::new(0.5, true, 0.5, 0.5).unwrap();

    let result = lp.run_query("q", &prefs, 10).await;

    assert!(result.is_finished());
    assert_eq!(f.search.calls(), 0);
    assert_eq!(
        observation_sources(&result.trace),
        [ObservationSource::PolicyRejection("web_search".into())]
    );
    assert_eq!(
        observation_kinds(&result.trace),
        [Some(ErrorKind::PolicyViolation)]
    );
    let system = brain.requests.lock().unwrap()[0].system.clone().unwrap();
    assert!(!system.contains("- web_search"));
}

#[tokio::test]
async fn unknown_tool_is_reported_as_not_found() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        call("teleport", json!({})),
        finish("ok"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());
    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert!(result.is_finished());
    assert_eq!(observation_kinds(&result.trace), [Some(ErrorKind::NotFound)]);
}

#[tokio::test]
async fn turn_ceiling_stops_after_three_dispatches() {
    let f = fixture();
    let brain = Arc::new(MockBrain::repeating(
        json!({"toolName": "echo", "arguments": {"text": "again"}}).to_string(),
    ));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("loop forever", &PreferenceVector::default(), 3).await;

    assert_eq!(result.termination, TerminationReason::MaxTurnsExceeded);
    assert_eq!(result.error, Some(LoopError::MaxTurnsExceeded { max_turns: 3 }));
    assert_eq!(f.echo.calls(), 3);
    assert_eq!(result.turns, 3);
    assert!(result.answer.contains("echo: again"));
    assert_eq!(result.sources, ["echo"]);
    assert_eq!(result.trace.len(), 1 + 3 * 2);
    assert!(is_well_formed(&result.trace));
}

#[tokio::test]
async fn zero_turns_terminates_immediately() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(Vec::new()));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 0).await;

    assert_eq!(result.termination, TerminationReason::MaxTurnsExceeded);
    assert_eq!(result.turns, 0);
    assert!(!result.answer.is_empty());
    assert_eq!(result.trace.len(), 1);
    assert_eq!(brain.call_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fourth_consecutive_malformed_output_is_fatal() {
    let f = fixture();
    let brain = Arc::new(MockBrain::repeating("I refuse to emit JSON."));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert_eq!(result.termination, TerminationReason::FatalError);
    assert_eq!(
        result.error,
        Some(LoopError::RepeatedMalformedOutput { failures: 4 })
    );
    assert_eq!(result.turns, 4);
    assert_eq!(result.trace.len(), 1 + 4 * 2);
    assert!(is_well_formed(&result.trace));
    assert!(
        observation_kinds(&result.trace)
            .iter()
            .all(|k| *k == Some(ErrorKind::Malformed))
    );
}

#[tokio::test]
async fn successful_parse_resets_malformed_counter() {
    let f = fixture();
    let garbage = || Step::Reply("not json".into());
    let brain = Arc::new(MockBrain::new(vec![
        garbage(),
        garbage(),
        garbage(),
        call("echo", json!({"text": "x"})),
        garbage(),
        garbage(),
        garbage(),
        finish("made it"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert!(result.is_finished());
    assert_eq!(result.answer, "made it");
    assert_eq!(result.turns, 8);
}

#[tokio::test]
async fn finish_without_answer_is_a_schema_violation() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        call("finish", json!({})),
        finish("now with an answer"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert!(result.is_finished());
    assert_eq!(
        observation_kinds(&result.trace),
        [Some(ErrorKind::SchemaViolation)]
    );
    assert_eq!(
        observation_sources(&result.trace),
        [ObservationSource::ParseFailure]
    );
}

#[tokio::test]
async fn invalid_arguments_are_observed_and_loop_continues() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        call("echo", json!({"wrong": 1})),
        finish("ok"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert!(result.is_finished());
    assert_eq!(f.echo.calls(), 0);
    assert_eq!(observation_kinds(&result.trace), [Some(ErrorKind::Validation)]);
}

#[tokio::test(start_paused = true)]
async fn brain_timeout_becomes_an_observation() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![Step::Hang, finish("late but fine")]));
    let config = LoopConfig {
        brain_timeout: Duration::from_secs(1),
        ..LoopConfig::default()
    };
    let lp = build(&brain, &f.registry, config);

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert!(result.is_finished());
    assert_eq!(result.turns, 2);
    assert_eq!(
        observation_sources(&result.trace),
        [ObservationSource::BrainTimeout]
    );
    assert_eq!(observation_kinds(&result.trace), [Some(ErrorKind::Timeout)]);
}

#[tokio::test]
async fn retryable_brain_error_consumes_a_turn() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        Step::Fail(BrainError::RateLimited),
        finish("recovered"),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert!(result.is_finished());
    assert_eq!(
        observation_sources(&result.trace),
        [ObservationSource::BrainFailure]
    );
}

#[tokio::test]
async fn loading_model_is_retried_and_unloaded_model_is_fatal() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        Step::Fail(BrainError::Server {
            status: 503,
            body: "Model is loading".into(),
        }),
        Step::Fail(BrainError::ModelNotFound("nemotron-orchestrator-8b".into())),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert_eq!(result.termination, TerminationReason::FatalError);
    assert_eq!(
        observation_sources(&result.trace),
        [ObservationSource::BrainFailure]
    );
    match result.error {
        Some(LoopError::Brain { message }) => {
            assert_eq!(message, "model not found: nemotron-orchestrator-8b")
        }
        other => panic!("expected a brain error, got {other:?}"),
    }
}

#[tokio::test]
async fn fatal_brain_error_stops_the_run() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        call("echo", json!({"text": "first"})),
        Step::Fail(BrainError::AuthFailed("bad key".into())),
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert_eq!(result.termination, TerminationReason::FatalError);
    assert!(matches!(result.error, Some(LoopError::Brain { .. })));
    assert!(result.answer.contains("echo: first"));
    assert!(is_well_formed(&result.trace));
}

#[tokio::test(start_paused = true)]
async fn slow_tool_times_out() {
    let f = fixture_with_echo(Counting::slow(Duration::from_secs(30)));
    let brain = Arc::new(MockBrain::new(vec![
        call("echo", json!({"text": "x"})),
        finish("gave up on echo"),
    ]));
    let config = LoopConfig {
        tool_timeout: Duration::from_secs(1),
        ..LoopConfig::default()
    };
    let lp = build(&brain, &f.registry, config);

    let result = lp.run_query("q", &PreferenceVector::default(), 10).await;

    assert!(result.is_finished());
    assert_eq!(observation_kinds(&result.trace), [Some(ErrorKind::Timeout)]);
}

#[tokio::test]
async fn cancelled_before_start() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(Vec::new()));
    let lp = build(&brain, &f.registry, LoopConfig::default());
    let token = CancellationToken::new();
    token.cancel();

    let result = lp
        .run_query_with_cancel("q", &PreferenceVector::default(), 10, &token)
        .await;

    assert_eq!(result.termination, TerminationReason::Cancelled);
    assert_eq!(result.error, Some(LoopError::Cancelled));
    assert_eq!(result.turns, 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_drops_the_in_flight_turn() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(vec![
        call("echo", json!({"text": "one"})),
        Step::Hang,
    ]));
    let lp = build(&brain, &f.registry, LoopConfig::default());
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    let result = lp
        .run_query_with_cancel("q", &PreferenceVector::default(), 10, &token)
        .await;

    assert_eq!(result.termination, TerminationReason::Cancelled);
    assert_eq!(result.trace.len(), 3);
    assert!(is_well_formed(&result.trace));
    assert_eq!(f.echo.calls(), 1);
}

#[test]
fn invalid_config_is_rejected() {
    let f = fixture();
    let brain = Arc::new(MockBrain::new(Vec::new()));
    let config = LoopConfig {
        max_turns: 0,
        ..LoopConfig::default()
    };
    assert!(ExecutionLoop::new(brain, f.registry, config).is_err());
}
