//! Oracle error types.

use thiserror::Error;

/// Failures from the external scoring service. All of them are
/// recoverable from the caller's perspective; the reducer falls back to
/// a truncated candidate list.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(String),

    #[error("oracle returned malformed output: {0}")]
    Malformed(String),

    #[error("oracle returned an empty choice")]
    EmptyChoice,

    #[error("oracle is not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
