//! Actor session mirror.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated actor as last known to this process.
///
/// Authentication is derived from the presence of a user id, so a session
/// can never claim to be authenticated without one (or carry a user id while
/// anonymous). The opaque token is owned by the auth provider and is not
/// part of this value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorSession {
    user_id: Option<String>,
    verified_at: Option<DateTime<Utc>>,
}

impl ActorSession {
    /// The default, unauthenticated session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated session verified now.
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self::verified_at(user_id, Utc::now())
    }

    /// An authenticated session verified at a known instant.
    pub fn verified_at(user_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            verified_at: Some(at),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// When the remote provider last confirmed this session.
    pub fn last_verified(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    /// Time since the last remote confirmation, if any.
    pub fn staleness(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.verified_at.map(|at| now.signed_duration_since(at))
    }

    pub(crate) fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            is_authenticated: self.is_authenticated(),
            user_id: self.user_id.clone(),
            verified_at: self.verified_at,
        }
    }

    /// Rebuild from the stored form. Returns `None` when the stored flags
    /// contradict each other.
    pub(crate) fn from_persisted(stored: PersistedSession) -> Option<Self> {
        match (stored.is_authenticated, stored.user_id) {
            (true, Some(user_id)) if !user_id.is_empty() => Some(Self {
                user_id: Some(user_id),
                verified_at: stored.verified_at,
            }),
            (false, None) => Some(Self::anonymous()),
            _ => None,
        }
    }
}

/// On-disk form, kept readable: `{"is_authenticated":true,"user_id":"..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedSession {
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_user() {
        let session = ActorSession::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.user_id().is_none());
        assert!(session.last_verified().is_none());
    }

    #[test]
    fn test_authenticated_carries_user() {
        let session = ActorSession::authenticated("user-123");
        assert!(session.is_authenticated());
        assert_eq!(session.user_id(), Some("user-123"));
        assert!(session.last_verified().is_some());
    }

    #[test]
    fn test_staleness() {
        let at = Utc::now() - chrono::Duration::seconds(90);
        let session = ActorSession::verified_at("u", at);
        let stale = session.staleness(Utc::now()).unwrap();
        assert!(stale.num_seconds() >= 90);
        assert!(ActorSession::anonymous().staleness(Utc::now()).is_none());
    }

    #[test]
    fn test_contradictory_stored_flags_are_rejected() {
        let flag_without_user = PersistedSession {
            is_authenticated: true,
            user_id: None,
            verified_at: None,
        };
        assert!(ActorSession::from_persisted(flag_without_user).is_none());

        let user_without_flag = PersistedSession {
            is_authenticated: false,
            user_id: Some("user-1".to_string()),
            verified_at: None,
        };
        assert!(ActorSession::from_persisted(user_without_flag).is_none());
    }
}
