//! Brain client trait for model backends.
//!
//! [`BrainClient`] uses RPITIT and is not object-safe. The loop is generic
//! over its client; tools that wrap a model hold a concrete client too.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::types::{BrainRequest, BrainResponse};

/// Ways a chat-completions backend can fail a brain call.
///
/// The variants follow what a local LM Studio server (or a hosted
/// OpenAI-compatible endpoint) actually reports: a server that is not
/// running, a model that is still loading or was never loaded, a prompt
/// that overflows the context window, and completions with no content.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BrainError {
    /// The server could not be reached: not running, refused or reset.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// No response within the client deadline.
    #[error("timed out")]
    Timeout,

    /// HTTP 429.
    #[error("rate limited")]
    RateLimited,

    /// A 5xx answer, typically a model that is still loading.
    #[error("server error {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body as sent by the server.
        body: String,
    },

    /// The API key was rejected.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The requested model is not loaded or does not exist.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The server refused the request itself, e.g. the prompt exceeds the
    /// model's context window.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response carried no completion choice.
    #[error("empty completion from {model}")]
    EmptyCompletion {
        /// Model that produced the empty response.
        model: String,
    },

    /// The body was not a chat completion.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl BrainError {
    /// Whether the same request could succeed on a later turn.
    ///
    /// Transport trouble, throttling, 5xx answers and empty completions are
    /// transient. Credentials, missing models and rejected prompts are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrainError::Unreachable(_)
                | BrainError::Timeout
                | BrainError::RateLimited
                | BrainError::Server { .. }
                | BrainError::EmptyCompletion { .. }
        )
    }
}

/// A model that answers one [`BrainRequest`] with one completion.
///
/// Implementations report transport and server trouble through
/// [`BrainError`]; the loop decides from [`BrainError::is_retryable`]
/// whether to spend a turn and carry on or stop the run.
pub trait BrainClient: Send + Sync {
    /// Request a single completion.
    fn complete(
        &self,
        request: BrainRequest,
    ) -> impl Future<Output = Result<BrainResponse, BrainError>> + Send;
}

impl<T: BrainClient> BrainClient for Arc<T> {
    fn complete(
        &self,
        request: BrainRequest,
    ) -> impl Future<Output = Result<BrainResponse, BrainError>> + Send {
        (**self).complete(request)
    }
}
