//! Prompt and context rendering.
//!
//! The brain sees a system prompt (instructions, eligible tools, routing
//! directive) followed by the turn history flattened into user/assistant
//! messages. Observations become user messages tagged with their source.

use orchestra_types::{
    AssistantAction, ConversationState, ErrorKind, Observation, ObservationSource, ToolDescriptor,
    Turn,
};

use crate::types::BrainMessage;

/// Base instructions, prepended to the tool list and directive.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an orchestrator that answers questions accurately by calling tools.

On every turn, output exactly one JSON object and nothing else:
{\"reasoning\": \"what you will do and why\", \"toolName\": \"tool_name\", \"arguments\": {\"param\": \"value\"}, \"confidence\": 0.0}

Rules:
1. Output raw JSON. No markdown code fences.
2. Only call tools from the list below, with the listed arguments.
3. Read each observation before deciding the next step.
4. When you have the complete answer, call finish with {\"answer\": \"...\", \"sources\": [\"...\"]}.

Example:
{\"reasoning\": \"I need current information\", \"toolName\": \"web_search\", \"arguments\": {\"query\": \"latest rust release\"}, \"confidence\": 0.9}";

/// Assistant content recorded when the brain produced nothing.
const NO_RESPONSE: &str = "(no response)";

/// Compose the system prompt from the base instructions, the eligible tools
/// and the routing directive.
pub fn render_system_prompt(base: &str, tools: &[ToolDescriptor], directive: &str) -> String {
    let mut prompt = String::from(base.trim_end());
    prompt.push_str("\n\nAvailable tools:\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}", tool.name, tool.description));
        let params = describe_parameters(tool);
        if !params.is_empty() {
            prompt.push_str(&format!(" ({params})"));
        }
        prompt.push('\n');
    }
    if !directive.is_empty() {
        prompt.push_str("\nGuidance:\n");
        prompt.push_str(directive);
        prompt.push('\n');
    }
    prompt
}

fn describe_parameters(tool: &ToolDescriptor) -> String {
    let required = tool.required_parameters();
    let Some(properties) = tool
        .parameter_schema
        .get("properties")
        .and_then(|p| p.as_object())
    else {
        return String::new();
    };
    properties
        .iter()
        .map(|(name, schema)| {
            let ty = schema.get("type").and_then(|t| t.as_str()).unwrap_or("any");
            let marker = if required.contains(&name.as_str()) {
                ""
            } else {
                "?"
            };
            format!("{name}{marker}: {ty}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Flatten the history into the messages sent to the brain.
///
/// Observation text longer than `max_observation_chars` is truncated.
pub fn render_messages(state: &ConversationState, max_observation_chars: usize) -> Vec<BrainMessage> {
    state
        .turns()
        .iter()
        .map(|turn| match turn {
            Turn::UserQuery { text } => BrainMessage::user(text.clone()),
            Turn::AssistantAction(action) => BrainMessage::assistant(render_action(action)),
            Turn::Observation(observation) => {
                BrainMessage::user(truncate(&format_observation(observation), max_observation_chars))
            }
        })
        .collect()
}

fn render_action(action: &AssistantAction) -> String {
    match &action.action {
        Some(parsed) => parsed.to_json(),
        None if action.raw.trim().is_empty() => NO_RESPONSE.to_string(),
        None => action.raw.clone(),
    }
}

/// Render one observation the way the brain reads it.
pub fn format_observation(observation: &Observation) -> String {
    let label = observation.source.label();
    let Some(failure) = &observation.result.error else {
        return format!("[{label}] Result:\n{}", observation.result.output_text());
    };
    match (&observation.source, failure.kind) {
        (ObservationSource::ParseFailure, _) => format!(
            "Error: Could not parse your response. Please output a single valid JSON action. Error: {}",
            failure.message
        ),
        (ObservationSource::PolicyRejection(_), ErrorKind::NotFound) => format!(
            "[{label}] Error: {}. Choose one of the listed tools.",
            failure.message
        ),
        (ObservationSource::PolicyRejection(_), _) => format!(
            "[{label}] Error: {}. This tool is not allowed under the current preferences.",
            failure.message
        ),
        _ => format!("[{label}] Error: {}", failure.message),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((boundary, _)) => format!(
            "{}... [truncated, {} chars total]",
            &text[..boundary],
            text.chars().count()
        ),
        None => text.to_string(),
    }
}
