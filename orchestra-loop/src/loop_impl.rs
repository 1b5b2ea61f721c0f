//! The execution loop state machine.

use std::sync::Arc;

use orchestra_route::{Routing, RoutingPolicy};
use orchestra_tool::ToolRegistry;
use orchestra_turn::{
    ActionParser, BrainClient, BrainError, BrainRequest, BrainResponse, render_messages,
    render_system_prompt,
};
use orchestra_types::{
    Action, AssistantAction, ConversationState, Decimal, ErrorKind, LoopError, LoopResult,
    Observation, ObservationSource, PreferenceVector, TerminationReason, ToolResult,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, LoopConfig};
use crate::synthesis::{partial_answer, tools_used};

/// Drives one query at a time from question to [`LoopResult`].
///
/// Each turn: route, ask the brain, parse, check eligibility, dispatch,
/// observe. Generic over `B: BrainClient`. All per-query state lives in the
/// run itself, so one loop can serve concurrent queries through `&self`.
pub struct ExecutionLoop<B: BrainClient> {
    brain: B,
    registry: Arc<ToolRegistry>,
    policy: RoutingPolicy,
    parser: ActionParser,
    config: LoopConfig,
}

impl<B: BrainClient> ExecutionLoop<B> {
    /// Create a loop with the default routing policy and parser.
    pub fn new(
        brain: B,
        registry: Arc<ToolRegistry>,
        config: LoopConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            brain,
            registry,
            policy: RoutingPolicy::default(),
            parser: ActionParser::new(),
            config,
        })
    }

    /// Replace the routing policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the action parser.
    #[must_use]
    pub fn with_parser(mut self, parser: ActionParser) -> Self {
        self.parser = parser;
        self
    }

    /// The loop configuration.
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// The shared tool registry.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Answer `query` with the configured turn ceiling.
    pub async fn run(&self, query: &str, prefs: &PreferenceVector) -> LoopResult {
        self.run_query(query, prefs, self.config.max_turns).await
    }

    /// Answer `query` within `max_turns` brain calls.
    pub async fn run_query(
        &self,
        query: &str,
        prefs: &PreferenceVector,
        max_turns: u32,
    ) -> LoopResult {
        self.run_query_with_cancel(query, prefs, max_turns, &CancellationToken::new())
            .await
    }

    /// [`run_query`](Self::run_query) that stops early when `cancel` fires.
    ///
    /// A turn interrupted by cancellation is dropped whole; the returned
    /// trace holds only completed turns.
    pub async fn run_query_with_cancel(
        &self,
        query: &str,
        prefs: &PreferenceVector,
        max_turns: u32,
        cancel: &CancellationToken,
    ) -> LoopResult {
        let mut run = Run::new(query);
        tracing::info!(max_turns, privacy = prefs.privacy(), "run started");

        for turn in 0..max_turns {
            if cancel.is_cancelled() {
                return run.stop(LoopError::Cancelled);
            }

            let routing = self.policy.route(prefs, &self.registry);
            let request = self.request(&run.state, &routing);

            let brain_call =
                tokio::time::timeout(self.config.brain_timeout, self.brain.complete(request));
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return run.stop(LoopError::Cancelled),
                outcome = brain_call => outcome,
            };
            run.brain_calls += 1;

            let response = match outcome {
                Ok(Ok(response)) => response,
                Ok(Err(err)) if err.is_retryable() => {
                    tracing::warn!(turn, error = %err, "brain call failed, continuing");
                    run.brain_failure(
                        ObservationSource::BrainFailure,
                        ErrorKind::BrainFailure,
                        &err,
                    );
                    continue;
                }
                Ok(Err(err)) => {
                    tracing::error!(turn, error = %err, "brain call failed");
                    return run.stop(LoopError::Brain {
                        message: err.to_string(),
                    });
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        turn,
                        timeout_secs = self.config.brain_timeout.as_secs_f64(),
                        "brain call timed out"
                    );
                    run.brain_failure(
                        ObservationSource::BrainTimeout,
                        ErrorKind::Timeout,
                        &BrainError::Timeout,
                    );
                    continue;
                }
            };
            run.cost += response.cost;

            let action = match self.parser.parse(&response.text) {
                Ok(action) => {
                    run.parse_failures = 0;
                    action
                }
                Err(err) => {
                    run.parse_failures += 1;
                    tracing::warn!(
                        turn,
                        failures = run.parse_failures,
                        error = %err,
                        "unparseable brain output"
                    );
                    run.record(
                        AssistantAction::unparsed(response.text),
                        Observation::synthetic(
                            ObservationSource::ParseFailure,
                            ToolResult::failed(err.kind.into(), err.message),
                        ),
                    );
                    if run.parse_failures > self.config.max_parse_failures {
                        let failures = run.parse_failures;
                        return run.stop(LoopError::RepeatedMalformedOutput { failures });
                    }
                    continue;
                }
            };
            tracing::debug!(
                turn,
                tool = %action.tool_name,
                reasoning = ?action.reasoning,
                "brain chose tool"
            );

            if !routing.allows(&action.tool_name) {
                let rejection = self.rejection(&action.tool_name);
                tracing::warn!(
                    turn,
                    tool = %action.tool_name,
                    kind = ?rejection.error_kind(),
                    "action rejected"
                );
                let source = ObservationSource::PolicyRejection(action.tool_name.clone());
                run.record(
                    AssistantAction::parsed(response.text, action),
                    Observation::synthetic(source, rejection),
                );
                continue;
            }

            let arguments = action.arguments_value();
            let dispatch = self.registry.dispatch_with_timeout(
                &action.tool_name,
                &arguments,
                self.config.tool_timeout,
            );
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return run.stop(LoopError::Cancelled),
                result = dispatch => result,
            };
            run.cost += result.cost_incurred;

            if action.is_finish() && result.success() {
                return run.finish(response, action, &result.output);
            }

            let name = action.tool_name.clone();
            run.record(
                AssistantAction::parsed(response.text, action),
                Observation::from_tool(name, result),
            );
        }

        run.stop(LoopError::MaxTurnsExceeded { max_turns })
    }

    fn request(&self, state: &ConversationState, routing: &Routing) -> BrainRequest {
        BrainRequest {
            model: None,
            system: Some(render_system_prompt(
                &self.config.system_prompt,
                &routing.tools,
                &routing.directive,
            )),
            messages: render_messages(state, self.config.max_observation_chars),
            response_format: self.config.response_format,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    fn rejection(&self, tool: &str) -> ToolResult {
        if self.registry.contains(tool) {
            ToolResult::failed(
                ErrorKind::PolicyViolation,
                format!("tool '{tool}' is not eligible under the current preferences"),
            )
        } else {
            ToolResult::failed(ErrorKind::NotFound, format!("tool '{tool}' does not exist"))
        }
    }
}

/// Per-query state of one run.
struct Run {
    state: ConversationState,
    cost: Decimal,
    brain_calls: u32,
    parse_failures: u32,
}

impl Run {
    fn new(query: &str) -> Self {
        Self {
            state: ConversationState::new(query),
            cost: Decimal::ZERO,
            brain_calls: 0,
            parse_failures: 0,
        }
    }

    fn record(&mut self, action: AssistantAction, observation: Observation) {
        // Only `finish` seals the state, and the run returns right after it.
        if let Err(err) = self.state.record_exchange(action, observation) {
            tracing::error!(error = %err, "exchange not recorded");
        }
    }

    fn brain_failure(&mut self, source: ObservationSource, kind: ErrorKind, err: &BrainError) {
        self.record(
            AssistantAction::unparsed(String::new()),
            Observation::synthetic(
                source,
                ToolResult::failed(kind, format!("orchestrator call failed: {err}")),
            ),
        );
    }

    fn finish(mut self, response: BrainResponse, action: Action, payload: &Value) -> LoopResult {
        let answer = payload
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let sources = payload
            .get("sources")
            .and_then(Value::as_array)
            .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let confidence = payload
            .get("confidence")
            .and_then(Value::as_f64)
            .or(action.confidence);

        if let Err(err) = self
            .state
            .record_finish(AssistantAction::parsed(response.text, action))
        {
            tracing::error!(error = %err, "finish not recorded");
        }
        tracing::info!(turns = self.brain_calls, cost = %self.cost, "run finished");

        LoopResult {
            answer,
            sources,
            trace: self.state.into_turns(),
            termination: TerminationReason::Finished,
            error: None,
            cost: self.cost,
            turns: self.brain_calls,
            confidence,
        }
    }

    fn stop(self, error: LoopError) -> LoopResult {
        let answer = partial_answer(&self.state, &error);
        let sources = tools_used(&self.state);
        let termination = error.termination();
        tracing::info!(
            turns = self.brain_calls,
            cost = %self.cost,
            ?termination,
            error = %error,
            "run stopped"
        );
        LoopResult {
            answer,
            sources,
            trace: self.state.into_turns(),
            termination,
            error: Some(error),
            cost: self.cost,
            turns: self.brain_calls,
            confidence: None,
        }
    }
}
