//! Remote auth provider seam.

use crate::AuthResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// User as reported by the remote provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    pub id: String,
    pub email: Option<String>,
}

/// A session the remote provider considers live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    pub user: RemoteUser,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of registering an account.
///
/// `session` is `None` while the provider waits for the user to confirm
/// their email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: RemoteUser,
    pub session: Option<RemoteSession>,
}

/// Extra user metadata attached at sign-up.
#[derive(Debug, Clone, Default)]
pub struct SignUpMetadata {
    pub full_name: String,
}

/// The backend that owns credentials and session tokens.
///
/// `get_session` answers `Ok(None)` when the provider positively knows there
/// is no valid session; `Err` means the question could not be answered.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get_session(&self) -> AuthResult<Option<RemoteSession>>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> AuthResult<RemoteSession>;

    /// Register a new account. Providers that require email confirmation
    /// return the user without starting a session.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> AuthResult<SignUpOutcome>;

    async fn sign_out(&self) -> AuthResult<()>;
}
