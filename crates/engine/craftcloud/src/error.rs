//! Error types for quote retrieval

use printprompt_transport::TransportError;
use thiserror::Error;

/// Result type alias for quote operations
pub type Result<T> = std::result::Result<T, QuoteError>;

/// Errors that can occur while obtaining a print quote
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    /// The quote request itself is unusable; never retried
    #[error("Invalid quote request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Fetching the mesh or uploading it to the marketplace failed
    #[error("Model upload failed: {context}: {source}")]
    Upload {
        context: String,
        #[source]
        source: TransportError,
    },

    /// The upload succeeded but listed no usable model
    #[error("Model upload failed: service returned no model")]
    NoModelReturned,

    #[error("Pricing request failed: {0}")]
    Transport(#[from] TransportError),

    /// The price computation never reported completion within the poll budget
    #[error("Price calculation timed out after {attempts} attempts")]
    PollTimedOut { attempts: u32 },

    #[error("{}", exhausted_message(.attempts, .last_error))]
    RetriesExhausted {
        attempts: u32,
        last_error: Option<String>,
    },
}

fn exhausted_message(attempts: &u32, last_error: &Option<String>) -> String {
    match last_error {
        Some(last) => format!("Quote failed after {} attempts: {}", attempts, last),
        None => "Failed to get quote after multiple attempts".to_string(),
    }
}

impl QuoteError {
    /// Whether the whole upload, price, poll pipeline may be run again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuoteError::Upload { .. }
                | QuoteError::NoModelReturned
                | QuoteError::Transport(_)
                | QuoteError::PollTimedOut { .. }
        )
    }

    /// HTTP status of the underlying failure, if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            QuoteError::Upload { source, .. } | QuoteError::Transport(source) => {
                source.status_code()
            }
            _ => None,
        }
    }
}
