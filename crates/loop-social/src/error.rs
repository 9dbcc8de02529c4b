//! Error types for table access.

use loop_auth::AuthError;
use loop_interactions::InteractionError;
use thiserror::Error;

/// Errors from the table layer.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Network or transport-level HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase returned a non-success HTTP status.
    ///
    /// Common causes: expired token, RLS policy violation, constraint violation.
    #[error("Supabase error: {status} - {message}")]
    Supabase { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A requested row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] loop_storage::StorageError),

    /// Configuration or misuse error (bad URL, unfiltered delete, ...).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SocialError {
    /// A unique-constraint violation: the row is already there.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SocialError::Supabase { status: 409, .. })
    }
}

pub type SocialResult<T> = Result<T, SocialError>;

impl From<SocialError> for InteractionError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::NotFound(what) => InteractionError::NotFound(what),
            SocialError::Supabase { status: 401, .. } => InteractionError::AuthenticationRequired,
            other => InteractionError::TransportFailure(other.to_string()),
        }
    }
}

impl From<SocialError> for AuthError {
    fn from(err: SocialError) -> Self {
        AuthError::ProfileCreation(err.to_string())
    }
}
