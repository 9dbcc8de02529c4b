//! Owner of the process-wide actor session.
//!
//! The session exists in two places: an in-memory copy behind an `RwLock`
//! that the navigation fast path reads synchronously, and a persisted copy
//! stored as one JSON document under [`StorageKeys::ACTOR_SESSION`]. Writers
//! hold the write lock across both updates, so no reader ever sees a session
//! that is only partly written.

use crate::session::PersistedSession;
use crate::{ActorSession, KeyValueStore, StorageError, StorageKeys, StorageResult};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Single owner of the [`ActorSession`].
///
/// Shared by reference (`Arc<SessionLifecycle>`) between the session guard,
/// the authenticator and the interaction handlers. Only the guard and the
/// authenticator write to it.
pub struct SessionLifecycle {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<ActorSession>,
}

impl SessionLifecycle {
    /// Create the lifecycle and read whatever session was persisted.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let lifecycle = Self {
            store,
            current: RwLock::new(ActorSession::anonymous()),
        };
        lifecycle.load();
        lifecycle
    }

    /// Read the persisted session into memory and return it.
    ///
    /// Missing, unreadable or self-contradictory data yields the default
    /// unauthenticated session.
    pub fn load(&self) -> ActorSession {
        let mut current = self.write_guard();
        let session = match self.read_persisted() {
            Ok(Some(session)) => session,
            Ok(None) => ActorSession::anonymous(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session, using anonymous");
                ActorSession::anonymous()
            }
        };
        debug!(authenticated = session.is_authenticated(), "Session loaded");
        *current = session.clone();
        session
    }

    /// Snapshot of the in-memory session. Never blocks on I/O.
    pub fn current(&self) -> ActorSession {
        self.read_guard().clone()
    }

    /// Persist `session` and make it the cached truth.
    ///
    /// On a storage error the previous session stays in place.
    pub fn commit(&self, session: ActorSession) -> StorageResult<()> {
        let mut current = self.write_guard();
        let json = serde_json::to_string(&session.to_persisted())
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.store.set(StorageKeys::ACTOR_SESSION, &json)?;

        if *current != session {
            info!(
                authenticated = session.is_authenticated(),
                user_id = session.user_id().unwrap_or(""),
                "Session committed"
            );
        }
        *current = session;
        Ok(())
    }

    /// Reset to the unauthenticated default and remove the persisted copy.
    pub fn clear(&self) -> StorageResult<()> {
        let mut current = self.write_guard();
        // Memory first: a failed delete must not leave the actor authenticated here.
        let was_authenticated = current.is_authenticated();
        *current = ActorSession::anonymous();
        self.store.delete(StorageKeys::ACTOR_SESSION)?;
        if was_authenticated {
            info!("Session cleared");
        }
        Ok(())
    }

    fn read_persisted(&self) -> StorageResult<Option<ActorSession>> {
        let Some(json) = self.store.get(StorageKeys::ACTOR_SESSION)? else {
            return Ok(None);
        };
        let stored: PersistedSession =
            serde_json::from_str(&json).map_err(|e| StorageError::Encoding(e.to_string()))?;
        ActorSession::from_persisted(stored)
            .map(Some)
            .ok_or_else(|| StorageError::Encoding("inconsistent persisted session".to_string()))
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ActorSession> {
        self.current.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ActorSession> {
        self.current.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("current", &*self.read_guard())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStore, MemoryStore};
    use tempfile::tempdir;

    fn memory_lifecycle() -> (Arc<MemoryStore>, SessionLifecycle) {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = SessionLifecycle::new(store.clone());
        (store, lifecycle)
    }

    #[test]
    fn test_initial_load_is_anonymous() {
        let (_, lifecycle) = memory_lifecycle();
        assert_eq!(lifecycle.load(), ActorSession::anonymous());
        assert!(!lifecycle.current().is_authenticated());
    }

    #[test]
    fn test_commit_then_load_roundtrip() {
        let (_, lifecycle) = memory_lifecycle();
        let session = ActorSession::authenticated("user-42");

        lifecycle.commit(session.clone()).unwrap();
        let loaded = lifecycle.load();

        assert_eq!(loaded.is_authenticated(), session.is_authenticated());
        assert_eq!(loaded.user_id(), session.user_id());
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_clear_then_load_is_default() {
        let (store, lifecycle) = memory_lifecycle();
        lifecycle
            .commit(ActorSession::authenticated("user-42"))
            .unwrap();

        lifecycle.clear().unwrap();

        assert_eq!(lifecycle.load(), ActorSession::anonymous());
        assert!(!store.has(StorageKeys::ACTOR_SESSION).unwrap());
    }

    #[test]
    fn test_session_survives_process_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let lifecycle = SessionLifecycle::new(Arc::new(FileStore::open(&path).unwrap()));
            lifecycle
                .commit(ActorSession::authenticated("user-7"))
                .unwrap();
        }

        let lifecycle = SessionLifecycle::new(Arc::new(FileStore::open(&path).unwrap()));
        assert_eq!(lifecycle.current().user_id(), Some("user-7"));
    }

    #[test]
    fn test_failed_commit_is_not_visible_after_reload() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = FileStore::open(blocker.join("store.json")).unwrap();
        let lifecycle = SessionLifecycle::new(Arc::new(store));

        assert!(lifecycle
            .commit(ActorSession::authenticated("user-x"))
            .is_err());

        assert_eq!(lifecycle.current(), ActorSession::anonymous());
        assert_eq!(lifecycle.load(), ActorSession::anonymous());
    }

    #[test]
    fn test_corrupt_persisted_session_loads_anonymous() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                StorageKeys::ACTOR_SESSION,
                r#"{"is_authenticated":true}"#,
            )
            .unwrap();

        let lifecycle = SessionLifecycle::new(store);
        assert!(!lifecycle.current().is_authenticated());
    }

    #[test]
    fn test_concurrent_readers_see_whole_sessions() {
        let (_, lifecycle) = memory_lifecycle();
        let lifecycle = Arc::new(lifecycle);

        let writer = {
            let lifecycle = lifecycle.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    if i % 2 == 0 {
                        lifecycle
                            .commit(ActorSession::authenticated(format!("user-{i}")))
                            .unwrap();
                    } else {
                        lifecycle.clear().unwrap();
                    }
                }
            })
        };

        for _ in 0..200 {
            let seen = lifecycle.current();
            assert_eq!(seen.is_authenticated(), seen.user_id().is_some());
        }
        writer.join().unwrap();
    }
}
