//! Mapping of HTTP and reqwest failures onto [`BrainError`].

use orchestra_turn::BrainError;

/// Map a non-success HTTP status to a [`BrainError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> BrainError {
    match status.as_u16() {
        401 | 403 => BrainError::AuthFailed(body.to_string()),
        404 => BrainError::ModelNotFound(body.to_string()),
        400 | 413 | 422 => BrainError::Rejected(body.to_string()),
        429 => BrainError::RateLimited,
        code @ 500..=599 => BrainError::Server {
            status: code,
            body: body.to_string(),
        },
        _ => BrainError::InvalidResponse(format!("HTTP {status}: {body}")),
    }
}

/// Map a transport-level [`reqwest::Error`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> BrainError {
    if err.is_timeout() {
        BrainError::Timeout
    } else if err.is_decode() {
        BrainError::InvalidResponse(err.to_string())
    } else {
        BrainError::Unreachable(err.to_string())
    }
}
