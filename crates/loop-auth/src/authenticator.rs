//! Credential flows: sign in, sign up, sign out.

use crate::session_fsm::SessionMachineInput;
use crate::{AuthError, AuthProvider, AuthResult, SessionTracker, SignUpMetadata};
use async_trait::async_trait;
use loop_storage::{ActorSession, SessionLifecycle};
use std::sync::Arc;
use tracing::{debug, info, warn};

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Profile row created for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSeed {
    pub id: String,
    pub full_name: String,
    pub avatar_url: String,
}

impl ProfileSeed {
    /// Seed with a generated avatar keyed on the name without whitespace.
    pub fn for_user(id: impl Into<String>, full_name: &str) -> Self {
        let seed: String = full_name.split_whitespace().collect();
        Self {
            id: id.into(),
            full_name: full_name.to_string(),
            avatar_url: format!("{}?seed={}", AVATAR_BASE_URL, urlencoding::encode(&seed)),
        }
    }
}

/// Where new profiles are written.
#[async_trait]
pub trait ProfileWriter: Send + Sync {
    async fn create_profile(&self, profile: &ProfileSeed) -> AuthResult<()>;
}

pub struct Authenticator {
    provider: Arc<dyn AuthProvider>,
    lifecycle: Arc<SessionLifecycle>,
    tracker: Arc<SessionTracker>,
    profiles: Option<Arc<dyn ProfileWriter>>,
}

impl Authenticator {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        lifecycle: Arc<SessionLifecycle>,
        tracker: Arc<SessionTracker>,
    ) -> Self {
        Self {
            provider,
            lifecycle,
            tracker,
            profiles: None,
        }
    }

    /// Write a profile row for every account created through [`Self::sign_up`].
    pub fn with_profile_writer(mut self, profiles: Arc<dyn ProfileWriter>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Sign in with email and password.
    ///
    /// The session is committed only after the provider accepts the
    /// credentials; any failure leaves the cached session untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<ActorSession> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::ValidationFailure(
                "Please enter both email and password".to_string(),
            ));
        }

        debug!(email = %email, "Attempting email/password sign-in");

        let remote = match self.provider.sign_in_with_password(email, password).await {
            Ok(remote) => remote,
            Err(e) => {
                if matches!(e, AuthError::InvalidCredentials(_)) {
                    self.apply(SessionMachineInput::CredentialRejected, None);
                }
                warn!(error = %e, "Sign-in failed");
                return Err(e);
            }
        };

        let session = ActorSession::authenticated(remote.user.id.as_str());
        self.lifecycle.commit(session.clone())?;
        self.apply(SessionMachineInput::SignInSucceeded, session.user_id());

        info!(user_id = %remote.user.id, "Sign-in successful");
        Ok(session)
    }

    /// Create an account, write its profile, and sign the actor in.
    ///
    /// When the provider holds the account for email confirmation no session
    /// is started: the anonymous session comes back and the cache is left
    /// alone.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> AuthResult<ActorSession> {
        let email = email.trim();
        let full_name = full_name.trim();
        if email.is_empty() || password.is_empty() || full_name.is_empty() {
            return Err(AuthError::ValidationFailure(
                "Please enter your name, email and password".to_string(),
            ));
        }

        let metadata = SignUpMetadata {
            full_name: full_name.to_string(),
        };
        let outcome = self.provider.sign_up(email, password, &metadata).await?;
        let user = outcome.user;

        if let Some(profiles) = &self.profiles {
            let seed = ProfileSeed::for_user(user.id.as_str(), full_name);
            profiles.create_profile(&seed).await.map_err(|e| match e {
                AuthError::ProfileCreation(_) => e,
                other => AuthError::ProfileCreation(other.to_string()),
            })?;
        }

        if outcome.session.is_none() {
            info!(user_id = %user.id, "Account created, email confirmation pending");
            return Ok(ActorSession::anonymous());
        }

        let session = ActorSession::authenticated(user.id.as_str());
        self.lifecycle.commit(session.clone())?;
        self.apply(SessionMachineInput::SignInSucceeded, session.user_id());

        info!(user_id = %user.id, "Account created");
        Ok(session)
    }

    /// Sign out. The local session is cleared even when the provider call
    /// fails.
    pub async fn sign_out(&self) -> AuthResult<()> {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "Provider sign-out failed, clearing local session anyway");
        }

        self.lifecycle.clear()?;
        self.apply(SessionMachineInput::SignedOut, None);

        info!("Signed out");
        Ok(())
    }

    fn apply(&self, input: SessionMachineInput, user_id: Option<&str>) {
        if let Err(e) = self.tracker.transition(&input, user_id) {
            debug!(error = %e, "Ignoring session transition");
        }
    }
}
