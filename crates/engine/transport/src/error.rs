//! Error types for HTTP transport operations

use std::time::Duration;

/// Errors raised by a transport while performing a request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status
    #[error("HTTP error! status: {status}{}", message_suffix(.message))]
    Status {
        status: u16,
        url: String,
        /// `message` field of the error body, when the service sent one
        message: Option<String>,
    },

    /// Could not reach the server
    #[error("Connection error: {0}")]
    Connection(String),

    /// The client-side request timeout elapsed
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Any other failure while sending or reading the request
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The response body was not the JSON shape we expected
    #[error("Failed to parse response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(" - {}", message),
        None => String::new(),
    }
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// HTTP status code, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build a decode error from a serde failure
    pub fn decode(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        TransportError::Decode {
            url: url.into(),
            reason: err.to_string(),
        }
    }
}
