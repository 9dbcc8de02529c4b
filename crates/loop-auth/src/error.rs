//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Email or password rejected by the provider
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Input rejected before contacting the provider
    #[error("{0}")]
    ValidationFailure(String),

    /// Token refresh error
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Refresh retries exhausted
    #[error("Token refresh failed after {0} attempts")]
    RefreshExhausted(u32),

    /// Profile row could not be created after sign-up
    #[error("Profile creation failed: {0}")]
    ProfileCreation(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] loop_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable")]
    NetworkUnavailable,
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Connection failures, timeouts and 5xx responses are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::NetworkUnavailable => true,
            AuthError::Transport(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
