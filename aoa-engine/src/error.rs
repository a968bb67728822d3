//! Error types for the engine transports

use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine calls
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while calling an engine procedure
///
/// Every variant is a transport failure from the pipeline's point of view.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Interpreter could not be started
    #[error("Failed to spawn engine process: {0}")]
    Spawn(#[from] std::io::Error),

    /// Interpreter exited unsuccessfully
    #[error("Engine process failed (exit code {exit_code:?}): {stderr}")]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Engine service returned an error status code
    #[error("Engine API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse the reply
    #[error("Failed to parse engine reply: {0}")]
    ParseError(String),

    /// Reply parsed but is not a code array
    #[error("Malformed engine reply: {0}")]
    MalformedResponse(String),

    /// Procedure identity cannot be passed to the engine safely
    #[error("Invalid procedure: {0}")]
    InvalidProcedure(String),

    /// Call exceeded its deadline
    #[error("Engine call timed out after {0:?}")]
    TimedOut(Duration),
}

impl EngineError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }
}
