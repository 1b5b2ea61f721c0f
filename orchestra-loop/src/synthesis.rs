//! Best-effort answers for runs that end without `finish`.

use orchestra_types::{ConversationState, LoopError, ObservationSource};

/// Longest slice of an observation quoted in a partial answer.
const QUOTE_CHARS: usize = 2_000;

/// Compose a non-empty answer from whatever the trace supports.
///
/// Prefers the last successful tool output, then the last observation's
/// message, then a fixed notice.
pub(crate) fn partial_answer(state: &ConversationState, error: &LoopError) -> String {
    let mut answer = notice(error);

    let last_success = state.observations().rev().find(|o| {
        matches!(o.source, ObservationSource::Tool(_)) && o.result.success()
    });
    if let Some(observation) = last_success {
        answer.push_str(&format!(
            "\n\nLast result from {}:\n{}",
            observation.source.label(),
            quote(&observation.result.output_text())
        ));
    } else if let Some(observation) = state.observations().next_back() {
        answer.push_str(&format!(
            "\n\nLast error ({}): {}",
            observation.source.label(),
            quote(&observation.result.output_text())
        ));
    }

    let used = tools_used(state);
    if !used.is_empty() {
        answer.push_str("\n\nTools used:");
        for name in &used {
            answer.push_str(&format!("\n- {name}"));
        }
    }
    answer
}

/// Distinct dispatched tool names, in first-use order.
pub(crate) fn tools_used(state: &ConversationState) -> Vec<String> {
    let mut used: Vec<String> = Vec::new();
    for observation in state.observations() {
        if let ObservationSource::Tool(name) = &observation.source {
            if !used.iter().any(|u| u == name) {
                used.push(name.clone());
            }
        }
    }
    used
}

fn notice(error: &LoopError) -> String {
    match error {
        LoopError::MaxTurnsExceeded { .. } => {
            "I was unable to complete the task within the allowed number of steps. \
             Here's what I found so far."
                .to_string()
        }
        LoopError::RepeatedMalformedOutput { failures } => format!(
            "I could not produce a valid action after {failures} consecutive attempts. \
             Here's what I found so far."
        ),
        LoopError::Cancelled => "The request was cancelled before an answer was found.".to_string(),
        LoopError::Brain { message } => format!("The orchestrator model failed: {message}."),
        other => format!("The run stopped early: {other}."),
    }
}

fn quote(text: &str) -> String {
    match text.char_indices().nth(QUOTE_CHARS) {
        Some((boundary, _)) => format!("{}...", &text[..boundary]),
        None => text.to_string(),
    }
}
