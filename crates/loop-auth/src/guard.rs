//! Navigation gate.
//!
//! Every navigation goes through [`SessionGuard::authorize`]: a synchronous
//! check against the cached [`ActorSession`] first, then an authoritative
//! check with the remote provider. The cached answer is only ever a hint;
//! the remote answer reconciles the cache.

use crate::session_fsm::{SessionMachineInput, SessionState};
use crate::{AuthProvider, Decision, RouteTable, SessionTracker};
use loop_storage::{ActorSession, SessionLifecycle};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SessionGuard {
    lifecycle: Arc<SessionLifecycle>,
    provider: Arc<dyn AuthProvider>,
    tracker: Arc<SessionTracker>,
    routes: RouteTable,
}

impl SessionGuard {
    pub fn new(
        lifecycle: Arc<SessionLifecycle>,
        provider: Arc<dyn AuthProvider>,
        tracker: Arc<SessionTracker>,
        routes: RouteTable,
    ) -> Self {
        Self {
            lifecycle,
            provider,
            tracker,
            routes,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn state(&self) -> SessionState {
        self.tracker.state()
    }

    /// The cached-session fast path.
    ///
    /// Returns a redirect when the cache says unauthenticated and `path` is
    /// protected; `None` means the remote check decides. Never blocks on I/O.
    pub fn precheck(&self, path: &str) -> Option<Decision> {
        let cached = self.lifecycle.current();
        if cached.is_authenticated() || self.routes.is_public(path) {
            return None;
        }
        debug!(path = %path, "No cached session, redirecting to login");
        if let Err(e) = self.tracker.transition(&SessionMachineInput::CacheMiss, None) {
            debug!(error = %e, "Ignoring session transition");
        }
        Some(self.routes.redirect_to_login())
    }

    /// Decide whether `path` may be shown.
    ///
    /// Never fails: if the provider cannot be reached the cached session
    /// decides.
    pub async fn authorize(&self, path: &str) -> Decision {
        if let Some(decision) = self.precheck(path) {
            return decision;
        }

        match self.provider.get_session().await {
            Ok(Some(remote)) => {
                let user_id = remote.user.id;
                if let Err(e) = self
                    .lifecycle
                    .commit(ActorSession::authenticated(user_id.as_str()))
                {
                    warn!(error = %e, "Failed to persist verified session");
                }
                self.apply(SessionMachineInput::RemoteVerified, Some(&user_id));
                Decision::Allow
            }
            Ok(None) if self.routes.is_public(path) => Decision::Allow,
            Ok(None) => {
                debug!(path = %path, "Remote reports no session, clearing cache");
                if let Err(e) = self.lifecycle.clear() {
                    warn!(error = %e, "Failed to clear persisted session");
                }
                self.apply(SessionMachineInput::RemoteRejected, None);
                self.routes.redirect_to_login()
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %path,
                    "Remote session check failed, using cached session"
                );
                self.cached_decision(path)
            }
        }
    }

    /// Where `/` should send the actor: home when the cache says
    /// authenticated, otherwise the login page.
    pub fn landing_path(&self) -> &str {
        if self.lifecycle.current().is_authenticated() {
            &self.routes.home_path
        } else {
            &self.routes.login_path
        }
    }

    fn cached_decision(&self, path: &str) -> Decision {
        if self.lifecycle.current().is_authenticated() || self.routes.is_public(path) {
            Decision::Allow
        } else {
            self.routes.redirect_to_login()
        }
    }

    fn apply(&self, input: SessionMachineInput, user_id: Option<&str>) {
        if let Err(e) = self.tracker.transition(&input, user_id) {
            debug!(error = %e, "Ignoring session transition");
        }
    }
}
