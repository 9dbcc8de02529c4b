//! Gated interaction handlers.
//!
//! Each handler reads the cached session first. Without a user id the
//! gesture is refused with an "Authentication required" notice and nothing
//! changes; with one, toggles go through the [`OptimisticMutator`].

use crate::models::{Group, NewPost, Post};
use crate::SocialRepository;
use loop_interactions::{
    InteractionError, InteractionResult, Notice, NoticeSink, OptimisticMutator, PendingToggle,
    TargetCollection, TargetId, TargetKind,
};
use loop_storage::SessionLifecycle;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SocialActions {
    lifecycle: Arc<SessionLifecycle>,
    repository: SocialRepository,
    mutator: OptimisticMutator,
    notices: Arc<dyn NoticeSink>,
}

impl SocialActions {
    pub fn new(
        lifecycle: Arc<SessionLifecycle>,
        repository: SocialRepository,
        mutator: OptimisticMutator,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            lifecycle,
            repository,
            mutator,
            notices,
        }
    }

    /// Like or unlike a post shown in `collection`.
    pub fn toggle_like(
        &self,
        collection: &TargetCollection,
        post_id: &TargetId,
    ) -> InteractionResult<PendingToggle> {
        let user_id = self.require_user("like posts")?;
        let post = parse_id(post_id)?;
        let repository = self.repository.clone();

        self.mutator
            .toggle(collection, TargetKind::PostLike, post_id, move |liked| async move {
                repository
                    .set_like(&user_id, post, liked)
                    .await
                    .map_err(InteractionError::from)
            })
    }

    /// Join or leave a group shown in `collection`.
    pub fn toggle_membership(
        &self,
        collection: &TargetCollection,
        group_id: &TargetId,
    ) -> InteractionResult<PendingToggle> {
        let user_id = self.require_user("join groups")?;
        let group = parse_id(group_id)?;
        let repository = self.repository.clone();

        self.mutator.toggle(
            collection,
            TargetKind::GroupMembership,
            group_id,
            move |joined| async move {
                repository
                    .set_membership(&user_id, group, joined)
                    .await
                    .map_err(InteractionError::from)
            },
        )
    }

    /// Publish a post, optionally into a group.
    pub async fn create_post(&self, content: &str, group: Option<&Group>) -> InteractionResult<Post> {
        let content = content.trim();
        if content.is_empty() {
            let err = InteractionError::ValidationFailure("Post content cannot be empty".to_string());
            self.notices.notify(Notice::for_error("post", &err));
            return Err(err);
        }
        let user_id = self.require_user("post")?;

        let mut new_post = NewPost::new(content);
        if let Some(group) = group {
            new_post = new_post.in_group(group);
        }

        match self.repository.create_post(&user_id, &new_post).await {
            Ok(post) => {
                let description = match group {
                    Some(_) => "Your post has been published to the group",
                    None => "Your post has been published",
                };
                self.notices.notify(Notice::info("Post created", description));
                Ok(post)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create post");
                let err = InteractionError::from(e);
                self.notices.notify(Notice::for_error("publish post", &err));
                Err(err)
            }
        }
    }

    fn require_user(&self, action: &str) -> InteractionResult<String> {
        match self.lifecycle.current().user_id() {
            Some(user_id) => Ok(user_id.to_string()),
            None => {
                debug!(action = %action, "Gated action without session");
                let err = InteractionError::AuthenticationRequired;
                self.notices.notify(Notice::for_error(action, &err));
                Err(err)
            }
        }
    }
}

fn parse_id(id: &TargetId) -> InteractionResult<i64> {
    id.as_str()
        .parse()
        .map_err(|_| InteractionError::NotFound(id.to_string()))
}
