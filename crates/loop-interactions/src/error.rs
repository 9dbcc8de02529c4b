//! Interaction error types.

use thiserror::Error;

/// Errors surfaced by user-initiated interactions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    /// A gated action was attempted without a session
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The remote write could not be completed
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Input rejected before any write
    #[error("{0}")]
    ValidationFailure(String),

    /// The target does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl InteractionError {
    /// Whether repeating the same gesture may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InteractionError::TransportFailure(_))
    }
}

/// Result type alias using InteractionError.
pub type InteractionResult<T> = Result<T, InteractionError>;
