//! # orchestra-types: data model for preference-routed tool orchestration
//!
//! Everything the execution loop passes between its parts lives here:
//!
//! | Type | What it is |
//! |------|------------|
//! | [`PreferenceVector`] | Caller trade-offs: budget, privacy, speed, quality |
//! | [`ToolDescriptor`] | Name, schema and cost/latency hints of a registered tool |
//! | [`Action`] | One decision of the brain: tool name + arguments |
//! | [`ToolResult`] | What a dispatched action produced |
//! | [`ConversationState`] | The append-only turn history of one query |
//! | [`LoopResult`] | Final answer, trace and termination reason |
//!
//! The crate has no async code and no I/O. Traits for executors and model
//! clients live in `orchestra-tool` and `orchestra-turn`.

#![deny(missing_docs)]

pub mod action;
pub mod conversation;
pub mod error;
pub mod outcome;
pub mod preference;
pub mod result;
pub mod tool;

pub use action::{Action, FINISH_TOOL};
pub use conversation::{
    AssistantAction, ConversationError, ConversationState, Observation, ObservationSource, Turn,
    is_well_formed,
};
pub use error::{ParseError, ParseErrorKind};
pub use outcome::{LoopError, LoopResult, TerminationReason};
pub use preference::{PreferenceError, PreferenceVector};
pub use result::{ErrorKind, ToolFailure, ToolResult};
pub use tool::{CapabilityClass, CostClass, LatencyClass, ToolDescriptor, ToolKind};

pub use rust_decimal::Decimal;
