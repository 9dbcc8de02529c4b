//! In-process auth provider for demo mode and tests.

use crate::{
    AuthError, AuthProvider, AuthResult, RemoteSession, RemoteUser, SignUpMetadata, SignUpOutcome,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    session: Option<RemoteUser>,
    next_id: u64,
}

/// Auth provider backed by an in-memory account table.
///
/// `set_offline(true)` makes every call fail with
/// [`AuthError::NetworkUnavailable`], which is how transport failures are
/// simulated.
#[derive(Debug, Default)]
pub struct MemoryAuth {
    state: Mutex<State>,
    offline: AtomicBool,
    confirm_email: AtomicBool,
    session_checks: AtomicUsize,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with a fixed user id.
    pub fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.to_string(),
                password: password.to_string(),
            },
        );
        self
    }

    /// Start a live session for `user_id` without going through sign-in.
    pub fn with_session(self, user_id: &str) -> Self {
        self.lock().session = Some(RemoteUser {
            id: user_id.to_string(),
            email: None,
        });
        self
    }

    /// New accounts must confirm their email before a session starts.
    pub fn with_email_confirmation(self) -> Self {
        self.confirm_email.store(true, Ordering::SeqCst);
        self
    }

    /// Drop the live session, as a server-side revocation would.
    pub fn revoke_session(&self) {
        self.lock().session = None;
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `get_session` calls seen so far.
    pub fn session_checks(&self) -> usize {
        self.session_checks.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn ensure_online(&self) -> AuthResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AuthError::NetworkUnavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn get_session(&self) -> AuthResult<Option<RemoteSession>> {
        self.session_checks.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        Ok(self.lock().session.clone().map(|user| RemoteSession {
            user,
            expires_at: None,
        }))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<RemoteSession> {
        self.ensure_online()?;
        let mut state = self.lock();
        let user_id = match state.accounts.get(email) {
            Some(account) if account.password == password => account.user_id.clone(),
            _ => {
                return Err(AuthError::InvalidCredentials(
                    "Invalid login credentials".to_string(),
                ))
            }
        };
        let user = RemoteUser {
            id: user_id,
            email: Some(email.to_string()),
        };
        state.session = Some(user.clone());
        debug!(user_id = %user.id, "Memory sign-in");
        Ok(RemoteSession {
            user,
            expires_at: None,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> AuthResult<SignUpOutcome> {
        self.ensure_online()?;
        let mut state = self.lock();
        if state.accounts.contains_key(email) {
            return Err(AuthError::ValidationFailure(
                "User already registered".to_string(),
            ));
        }
        state.next_id += 1;
        let user_id = format!("user-{}", state.next_id);
        state.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        let user = RemoteUser {
            id: user_id,
            email: Some(email.to_string()),
        };
        debug!(user_id = %user.id, full_name = %metadata.full_name, "Memory sign-up");
        if self.confirm_email.load(Ordering::SeqCst) {
            return Ok(SignUpOutcome {
                user,
                session: None,
            });
        }
        state.session = Some(user.clone());
        Ok(SignUpOutcome {
            session: Some(RemoteSession {
                user: user.clone(),
                expires_at: None,
            }),
            user,
        })
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.ensure_online()?;
        self.lock().session = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let auth = MemoryAuth::new().with_account("ada@loop.test", "hunter22", "user-ada");

        let err = auth
            .sign_in_with_password("ada@loop.test", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
        assert!(auth.get_session().await.unwrap().is_none());

        let session = auth
            .sign_in_with_password("ada@loop.test", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.user.id, "user-ada");
        assert!(auth.get_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let auth = MemoryAuth::new().with_session("user-1");
        auth.set_offline(true);

        let err = auth.get_session().await.unwrap_err();
        assert!(err.is_transient());
        assert!(auth.sign_out().await.is_err());
        assert_eq!(auth.session_checks(), 1);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicate_email() {
        let auth = MemoryAuth::new();
        let meta = SignUpMetadata {
            full_name: "Grace Hopper".to_string(),
        };

        let outcome = auth.sign_up("grace@loop.test", "cobol59", &meta).await.unwrap();
        assert_eq!(outcome.user.id, "user-1");
        assert!(outcome.session.is_some());
        assert!(auth.sign_up("grace@loop.test", "x", &meta).await.is_err());
    }

    #[tokio::test]
    async fn test_sign_up_awaiting_confirmation_has_no_session() {
        let auth = MemoryAuth::new().with_email_confirmation();
        let meta = SignUpMetadata {
            full_name: "Grace Hopper".to_string(),
        };

        let outcome = auth.sign_up("grace@loop.test", "cobol59", &meta).await.unwrap();
        assert!(outcome.session.is_none());
        assert!(auth.get_session().await.unwrap().is_none());

        // The account exists, so signing in after confirmation works.
        let session = auth
            .sign_in_with_password("grace@loop.test", "cobol59")
            .await
            .unwrap();
        assert_eq!(session.user.id, outcome.user.id);
    }
}
