//! User-visible notices.
//!
//! Interactions never show anything themselves; they hand a [`Notice`] to a
//! [`NoticeSink`] and the embedding surface decides how to render it.

use crate::InteractionError;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient message for the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
    /// Whether repeating the gesture may succeed.
    pub retryable: bool,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            description: description.into(),
            retryable: false,
        }
    }

    /// Notice for a failed `action` ("like posts", "join groups", ...).
    pub fn for_error(action: &str, error: &InteractionError) -> Self {
        let (title, description) = match error {
            InteractionError::AuthenticationRequired => (
                "Authentication required".to_string(),
                format!("Please log in to {}", action),
            ),
            InteractionError::TransportFailure(_) => (
                "Error".to_string(),
                format!("Failed to {}. Please try again later", action),
            ),
            InteractionError::ValidationFailure(msg) => ("Error".to_string(), msg.clone()),
            InteractionError::NotFound(what) => {
                ("Not found".to_string(), format!("{} no longer exists", what))
            }
        };
        Self {
            kind: NoticeKind::Error,
            title,
            description,
            retryable: error.is_retryable(),
        }
    }
}

/// Receives notices from interactions.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Discards every notice.
#[derive(Debug, Default)]
pub struct NullNotices;

impl NoticeSink for NullNotices {
    fn notify(&self, _notice: Notice) {}
}

/// Records notices for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotices {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, notice: Notice) {
        self.lock().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notices_records_in_order() {
        let sink = RecordingNotices::new();
        assert!(sink.is_empty());

        sink.notify(Notice::info("Post created", "Your post is live"));
        sink.notify(Notice::for_error(
            "like posts",
            &InteractionError::AuthenticationRequired,
        ));

        let notices = sink.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].kind, NoticeKind::Info);
        assert_eq!(notices[1].title, "Authentication required");
        assert_eq!(notices[1].description, "Please log in to like posts");

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn transport_notice_is_retryable() {
        let notice = Notice::for_error(
            "update like",
            &InteractionError::TransportFailure("connection reset".into()),
        );
        assert!(notice.retryable);
        assert_eq!(notice.kind, NoticeKind::Error);
    }
}
