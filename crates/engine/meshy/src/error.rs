//! Error types for mesh generation

use printprompt_transport::TransportError;

/// Errors that can occur while generating a mesh
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Missing or invalid credentials / settings. Never retried.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Empty or whitespace-only prompt. Never retried.
    #[error("Valid prompt is required")]
    InvalidPrompt,

    /// Another generation is already polling on this client
    #[error("A generation is already in progress on this client")]
    Busy,

    /// The service could not be reached or answered with an error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service reported the job as failed
    #[error("{0}")]
    Failed(String),

    /// The attempt budget ran out before the job reached a terminal state
    #[error("Preview generation timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },
}

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

impl GenerationError {
    /// Returns true if a caller could reasonably try the whole call again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Transport(_) | GenerationError::TimedOut { .. } | GenerationError::Busy
        )
    }
}
