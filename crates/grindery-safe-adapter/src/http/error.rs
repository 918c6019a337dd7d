/*
[INPUT]:  Error sources (HTTP transport, server status, wallet signing, serialization)
[OUTPUT]: Structured error types with classification and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Upper bound on how much of a server response body is kept in an error.
const MAX_BODY_IN_ERROR: usize = 512;

/// Main error type for the Grindery Safe adapter
#[derive(Error, Debug)]
pub enum AuthError {
    /// HTTP request could not complete
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Wallet refused or failed to sign
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation did not finish in time
    #[error("Timed out after {duration}s")]
    Timeout { duration: u64 },
}

/// Coarse error classes used when containing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response
    Network,
    /// The server produced a non-success response
    Server,
    /// The wallet did not produce a signature
    Signing,
    /// Local fault (bad config, undecodable payload)
    Local,
}

impl AuthError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Http(_) | AuthError::Timeout { .. } => true,
            AuthError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Http(_) | AuthError::Timeout { .. } => ErrorKind::Network,
            AuthError::Server { .. } => ErrorKind::Server,
            AuthError::Signing(_) => ErrorKind::Signing,
            AuthError::Serialization(_)
            | AuthError::UrlParse(_)
            | AuthError::InvalidResponse(_)
            | AuthError::Config(_) => ErrorKind::Local,
        }
    }

    /// Create a server error from status code and response body
    pub fn server_error(status: StatusCode, body: impl Into<String>) -> Self {
        let mut message: String = body.into();
        if message.len() > MAX_BODY_IN_ERROR {
            let mut cut = MAX_BODY_IN_ERROR;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        if message.is_empty() {
            message = status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string();
        }
        AuthError::Server {
            status: status.as_u16(),
            message,
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AuthError>;
