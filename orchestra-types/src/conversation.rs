//! Turn history of one query.
//!
//! The history is `UserQuery, (AssistantAction, Observation)*` optionally
//! followed by one terminal `AssistantAction`. [`ConversationState`] only
//! exposes operations that keep that shape: an action and its observation
//! are appended together, and the terminal action seals the state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;
use crate::result::ToolResult;

/// Misuse of a [`ConversationState`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// The terminal action was already recorded.
    #[error("conversation already finished")]
    Sealed,
}

/// What the brain produced on one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantAction {
    /// Raw model text. Empty when the brain call itself failed.
    pub raw: String,
    /// The parsed action, if parsing succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl AssistantAction {
    /// A successfully parsed output.
    pub fn parsed(raw: impl Into<String>, action: Action) -> Self {
        Self {
            raw: raw.into(),
            action: Some(action),
        }
    }

    /// Output that could not be parsed (or no output at all).
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            action: None,
        }
    }
}

/// Where an observation came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "tool", rename_all = "snake_case")]
pub enum ObservationSource {
    /// The named tool was dispatched.
    Tool(String),
    /// The brain output could not be parsed.
    ParseFailure,
    /// The action named an ineligible or unknown tool and was not dispatched.
    PolicyRejection(String),
    /// The brain call timed out.
    BrainTimeout,
    /// The brain call failed with a recoverable error.
    BrainFailure,
}

impl ObservationSource {
    /// Label used when rendering the observation for the brain.
    pub fn label(&self) -> &str {
        match self {
            ObservationSource::Tool(name) | ObservationSource::PolicyRejection(name) => name,
            ObservationSource::ParseFailure => "parser",
            ObservationSource::BrainTimeout | ObservationSource::BrainFailure => "orchestrator",
        }
    }
}

/// The result fed back to the brain after an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Origin of the result.
    pub source: ObservationSource,
    /// The result itself; synthetic observations are failures.
    pub result: ToolResult,
}

impl Observation {
    /// Observation of a dispatched tool.
    pub fn from_tool(name: impl Into<String>, result: ToolResult) -> Self {
        Self {
            source: ObservationSource::Tool(name.into()),
            result,
        }
    }

    /// Observation synthesized by the loop.
    pub fn synthetic(source: ObservationSource, result: ToolResult) -> Self {
        Self { source, result }
    }
}

/// One entry in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "turn", rename_all = "snake_case")]
pub enum Turn {
    /// The query that started the run.
    UserQuery {
        /// Query text.
        text: String,
    },
    /// A brain output.
    AssistantAction(AssistantAction),
    /// The result of the preceding action.
    Observation(Observation),
}

/// Append-only history owned by one run of the loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    turns: Vec<Turn>,
    finished: bool,
}

impl ConversationState {
    /// Seed a history with the user's query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::UserQuery { text: query.into() }],
            finished: false,
        }
    }

    /// The query this history was seeded with.
    pub fn query(&self) -> &str {
        match self.turns.first() {
            Some(Turn::UserQuery { text }) => text,
            _ => "",
        }
    }

    /// Append an action together with its observation.
    pub fn record_exchange(
        &mut self,
        action: AssistantAction,
        observation: Observation,
    ) -> Result<(), ConversationError> {
        if self.finished {
            return Err(ConversationError::Sealed);
        }
        self.turns.push(Turn::AssistantAction(action));
        self.turns.push(Turn::Observation(observation));
        Ok(())
    }

    /// Append the terminal action and seal the history.
    pub fn record_finish(&mut self, action: AssistantAction) -> Result<(), ConversationError> {
        if self.finished {
            return Err(ConversationError::Sealed);
        }
        self.turns.push(Turn::AssistantAction(action));
        self.finished = true;
        Ok(())
    }

    /// Whether the terminal action has been recorded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of recorded brain outputs.
    pub fn action_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, Turn::AssistantAction(_)))
            .count()
    }

    /// Observations, oldest first.
    pub fn observations(&self) -> impl DoubleEndedIterator<Item = &Observation> {
        self.turns.iter().filter_map(|t| match t {
            Turn::Observation(obs) => Some(obs),
            _ => None,
        })
    }

    /// Consume the state, returning the trace.
    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

/// Check the alternation invariant on an arbitrary trace.
///
/// Returns true for `UserQuery, (AssistantAction, Observation)*` with an
/// optional trailing `AssistantAction`.
pub fn is_well_formed(turns: &[Turn]) -> bool {
    let mut iter = turns.iter();
    if !matches!(iter.next(), Some(Turn::UserQuery { .. })) {
        return false;
    }
    let rest: Vec<&Turn> = iter.collect();
    let mut i = 0;
    while i < rest.len() {
        match (rest.get(i), rest.get(i + 1)) {
            (Some(Turn::AssistantAction(_)), Some(Turn::Observation(_))) => i += 2,
            (Some(Turn::AssistantAction(_)), None) => i += 1,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorKind;
    use serde_json::json;

    fn finish_action() -> AssistantAction {
        let mut args = serde_json::Map::new();
        args.insert("answer".into(), json!("done"));
        AssistantAction::parsed("{}", Action::new("finish", args))
    }

    #[test]
    fn starts_with_query() {
        let state = ConversationState::new("what is 2+2?");
        assert_eq!(state.query(), "what is 2+2?");
        assert_eq!(state.turns().len(), 1);
        assert!(is_well_formed(state.turns()));
    }

    #[test]
    fn exchanges_keep_alternation() {
        let mut state = ConversationState::new("q");
        state
            .record_exchange(
                AssistantAction::unparsed("garbage"),
                Observation::synthetic(
                    ObservationSource::ParseFailure,
                    ToolResult::failed(ErrorKind::Malformed, "no JSON"),
                ),
            )
            .unwrap();
        state.record_finish(finish_action()).unwrap();
        assert!(state.is_finished());
        assert_eq!(state.action_count(), 2);
        assert!(is_well_formed(state.turns()));
    }

    #[test]
    fn finish_seals_the_state() {
        let mut state = ConversationState::new("q");
        state.record_finish(finish_action()).unwrap();
        assert_eq!(
            state.record_finish(finish_action()),
            Err(ConversationError::Sealed)
        );
        let obs = Observation::from_tool("x", ToolResult::ok(json!(1)));
        assert_eq!(
            state.record_exchange(finish_action(), obs),
            Err(ConversationError::Sealed)
        );
    }

    #[test]
    fn detects_broken_alternation() {
        let obs = Turn::Observation(Observation::from_tool("x", ToolResult::ok(json!(1))));
        let query = Turn::UserQuery { text: "q".into() };
        assert!(!is_well_formed(&[]));
        assert!(!is_well_formed(&[query.clone(), obs.clone()]));
        let action = Turn::AssistantAction(AssistantAction::unparsed(""));
        assert!(!is_well_formed(&[
            query.clone(),
            action.clone(),
            action.clone(),
            obs
        ]));
        assert!(is_well_formed(&[query, action]));
    }
}
