//! Error types for the Tekton client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the Tekton API
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, DNS or timeout failure
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status above the accepted threshold
    #[error("API error (status {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, or the canonical reason when it was empty
        message: String,
    },

    /// Response body could not be decoded
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Request could not be built from the given arguments
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an HTTP status error from status code and message
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Status code for `Http` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error happened below HTTP (connect, DNS, timeout)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
