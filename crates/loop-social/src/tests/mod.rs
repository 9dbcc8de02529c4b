//! End-to-end scenarios over the in-memory backends.
//!
//! - `repository.rs` - reads and absolute writes
//! - `scenarios.rs`  - sign-in, gated gestures, rollback and navigation

mod scenarios;

use crate::fixtures::{demo_auth, demo_tables};
use crate::{MemoryTables, SocialActions, SocialRepository};
use loop_auth::{Authenticator, MemoryAuth, RouteTable, SessionGuard, SessionTracker};
use loop_interactions::{OptimisticMutator, RecordingNotices};
use loop_storage::{MemoryStore, SessionLifecycle};
use std::sync::Arc;

pub(crate) struct App {
    pub tables: Arc<MemoryTables>,
    pub auth: Arc<MemoryAuth>,
    pub lifecycle: Arc<SessionLifecycle>,
    pub notices: Arc<RecordingNotices>,
    pub repository: SocialRepository,
    pub authenticator: Authenticator,
    pub guard: SessionGuard,
    pub actions: SocialActions,
}

/// Everything wired the way the CLI wires demo mode.
pub(crate) fn demo_app() -> App {
    let tables = Arc::new(demo_tables());
    let auth = Arc::new(demo_auth());
    let lifecycle = Arc::new(SessionLifecycle::new(Arc::new(MemoryStore::new())));
    let notices = Arc::new(RecordingNotices::new());
    let tracker = Arc::new(SessionTracker::new());
    let repository = SocialRepository::new(tables.clone());

    let authenticator = Authenticator::new(auth.clone(), lifecycle.clone(), tracker.clone())
        .with_profile_writer(Arc::new(repository.clone()));
    let guard = SessionGuard::new(
        lifecycle.clone(),
        auth.clone(),
        tracker,
        RouteTable::default(),
    );
    let actions = SocialActions::new(
        lifecycle.clone(),
        repository.clone(),
        OptimisticMutator::new(notices.clone()),
        notices.clone(),
    );

    App {
        tables,
        auth,
        lifecycle,
        notices,
        repository,
        authenticator,
        guard,
        actions,
    }
}

impl App {
    pub async fn sign_in_demo(&self) {
        self.authenticator
            .sign_in(crate::fixtures::DEMO_EMAIL, crate::fixtures::DEMO_PASSWORD)
            .await
            .unwrap();
    }
}
