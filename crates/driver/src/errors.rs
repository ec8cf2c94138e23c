//! Driver error types.

use thiserror::Error;

/// Failures surfaced by a browser driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("no element matches reference '{0}'")]
    ElementNotFound(String),

    #[error("browser session error: {0}")]
    Session(String),

    #[error("screenshot failed: {0}")]
    Screenshot(#[from] std::io::Error),
}

impl DriverError {
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
