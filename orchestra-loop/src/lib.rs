#![deny(missing_docs)]
//! The orchestra execution loop.
//!
//! [`ExecutionLoop`] answers a query by letting a brain model pick one tool
//! per turn under a caller's [`PreferenceVector`](orchestra_types::PreferenceVector):
//!
//! ```text
//! AwaitingAction -> Dispatching -> Observing -> AwaitingAction | Terminated
//! ```
//!
//! A run always yields a [`LoopResult`](orchestra_types::LoopResult) with
//! the full trace. Parse failures, policy rejections, tool failures and
//! recoverable brain errors are fed back to the brain as observations; only
//! the turn ceiling, repeated malformed output, a non-retryable brain error
//! or cancellation end a run early.

mod config;
mod loop_impl;
mod synthesis;

pub use config::{ConfigError, LoopConfig};
pub use loop_impl::ExecutionLoop;
pub use tokio_util::sync::CancellationToken;
