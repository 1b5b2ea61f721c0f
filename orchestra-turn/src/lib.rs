#![deny(missing_docs)]
//! Talking to the brain.
//!
//! - [`BrainClient`]: the model backend interface, generic (RPITIT) so the
//!   loop is monomorphized over its client.
//! - [`ActionParser`]: turns raw model text into an
//!   [`Action`](orchestra_types::Action) or a classified
//!   [`ParseError`](orchestra_types::ParseError).
//! - [`prompt`]: renders the system prompt and the message list the brain
//!   sees from a [`ConversationState`](orchestra_types::ConversationState).

pub mod brain;
pub mod parser;
pub mod prompt;
pub mod types;

pub use brain::{BrainClient, BrainError};
pub use parser::ActionParser;
pub use prompt::{DEFAULT_SYSTEM_PROMPT, format_observation, render_messages, render_system_prompt};
pub use types::{BrainMessage, BrainRequest, BrainResponse, ResponseFormat, Role, TokenUsage};
