//! Typed reads and writes over a [`TableStore`].

use crate::models::{Author, Group, NewPost, Post, Profile};
use crate::tables::{Filter, Row, TableStore};
use crate::{SocialError, SocialResult};
use async_trait::async_trait;
use chrono::Utc;
use loop_auth::{AuthResult, ProfileSeed, ProfileWriter};
use loop_interactions::{InteractionTarget, TargetCollection, TargetKind};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

const PROFILES: &str = "profiles";
const GROUPS: &str = "groups";
const GROUP_MEMBERS: &str = "group_members";
const POSTS: &str = "posts";
const POST_LIKES: &str = "post_likes";

#[derive(Clone)]
pub struct SocialRepository {
    tables: Arc<dyn TableStore>,
}

impl SocialRepository {
    pub fn new(tables: Arc<dyn TableStore>) -> Self {
        Self { tables }
    }

    pub async fn groups(&self) -> SocialResult<Vec<Group>> {
        let rows = self
            .tables
            .select(GROUPS, &Filter::new().order_asc("id"))
            .await?;
        decode_rows(rows)
    }

    pub async fn group(&self, group_id: i64) -> SocialResult<Group> {
        let rows = self
            .tables
            .select(GROUPS, &Filter::new().eq("id", group_id))
            .await?;
        decode_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| SocialError::NotFound(format!("group {}", group_id)))
    }

    pub async fn joined_group_ids(&self, user_id: &str) -> SocialResult<HashSet<i64>> {
        let rows = self
            .tables
            .select(GROUP_MEMBERS, &Filter::new().eq("user_id", user_id))
            .await?;
        Ok(column_ids(&rows, "group_id"))
    }

    /// Groups the actor belongs to. Empty when they have joined none.
    pub async fn joined_groups(&self, user_id: &str) -> SocialResult<Vec<Group>> {
        let ids = self.joined_group_ids(user_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        let rows = self
            .tables
            .select(GROUPS, &Filter::new().is_in("id", ids).order_asc("id"))
            .await?;
        decode_rows(rows)
    }

    /// Posts newest first, optionally limited to one group, with authors.
    pub async fn group_posts(&self, group_id: Option<i64>) -> SocialResult<Vec<Post>> {
        let mut filter = Filter::new();
        if let Some(group_id) = group_id {
            filter = filter.eq("group_id", group_id);
        }
        let rows = self
            .tables
            .select(POSTS, &filter.order_desc("created_at"))
            .await?;
        let mut posts: Vec<Post> = decode_rows(rows)?;
        self.attach_authors(&mut posts).await?;
        Ok(posts)
    }

    pub async fn liked_post_ids(&self, user_id: &str) -> SocialResult<HashSet<i64>> {
        let rows = self
            .tables
            .select(POST_LIKES, &Filter::new().eq("user_id", user_id))
            .await?;
        Ok(column_ids(&rows, "post_id"))
    }

    /// Make the actor's membership of `group_id` equal `joined`.
    ///
    /// Absolute rather than relative: joining twice or leaving a group the
    /// actor is not in both succeed.
    pub async fn set_membership(
        &self,
        user_id: &str,
        group_id: i64,
        joined: bool,
    ) -> SocialResult<()> {
        debug!(user_id = %user_id, group_id, joined, "Setting group membership");
        if joined {
            let row = object(json!({ "group_id": group_id, "user_id": user_id }));
            self.insert_ignoring_conflict(GROUP_MEMBERS, row).await
        } else {
            self.tables
                .delete(
                    GROUP_MEMBERS,
                    &Filter::new().eq("user_id", user_id).eq("group_id", group_id),
                )
                .await
        }
    }

    /// Make the actor's like of `post_id` equal `liked`.
    pub async fn set_like(&self, user_id: &str, post_id: i64, liked: bool) -> SocialResult<()> {
        debug!(user_id = %user_id, post_id, liked, "Setting post like");
        if liked {
            let row = object(json!({ "post_id": post_id, "user_id": user_id }));
            self.insert_ignoring_conflict(POST_LIKES, row).await
        } else {
            self.tables
                .delete(
                    POST_LIKES,
                    &Filter::new().eq("post_id", post_id).eq("user_id", user_id),
                )
                .await
        }
    }

    pub async fn create_post(&self, user_id: &str, post: &NewPost) -> SocialResult<Post> {
        let mut row = object(serde_json::to_value(post)?);
        row.insert("user_id".to_string(), Value::from(user_id));
        row.insert("created_at".to_string(), Value::from(Utc::now().to_rfc3339()));

        let inserted = self.tables.insert(POSTS, vec![row]).await?;
        let mut posts: Vec<Post> = decode_rows(inserted)?;
        self.attach_authors(&mut posts).await?;
        let post = posts
            .pop()
            .ok_or_else(|| SocialError::Config("insert returned no row".to_string()))?;

        info!(post_id = post.id, user_id = %user_id, "Post created");
        Ok(post)
    }

    pub async fn create_profile(&self, seed: &ProfileSeed) -> SocialResult<()> {
        let row = object(json!({
            "id": seed.id,
            "full_name": seed.full_name,
            "avatar_url": seed.avatar_url,
        }));
        self.tables.insert(PROFILES, vec![row]).await?;
        info!(user_id = %seed.id, "Profile created");
        Ok(())
    }

    pub async fn profile(&self, user_id: &str) -> SocialResult<Profile> {
        let rows = self
            .tables
            .select(PROFILES, &Filter::new().eq("id", user_id))
            .await?;
        decode_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| SocialError::NotFound(format!("profile {}", user_id)))
    }

    /// All groups plus a membership collection for the groups screen.
    pub async fn load_group_targets(
        &self,
        user_id: Option<&str>,
    ) -> SocialResult<(Vec<Group>, TargetCollection)> {
        let groups = self.groups().await?;
        let joined = match user_id {
            Some(user_id) => self.joined_group_ids(user_id).await?,
            None => HashSet::new(),
        };
        let collection = TargetCollection::from_targets(groups.iter().map(|g| {
            InteractionTarget::new(
                g.id.to_string(),
                TargetKind::GroupMembership,
                joined.contains(&g.id),
                g.member_count,
            )
        }));
        Ok((groups, collection))
    }

    /// Posts plus a like collection for a feed or group screen.
    pub async fn load_post_targets(
        &self,
        user_id: Option<&str>,
        group_id: Option<i64>,
    ) -> SocialResult<(Vec<Post>, TargetCollection)> {
        let posts = self.group_posts(group_id).await?;
        let liked = match user_id {
            Some(user_id) => self.liked_post_ids(user_id).await?,
            None => HashSet::new(),
        };
        let collection = TargetCollection::from_targets(posts.iter().map(|p| {
            InteractionTarget::new(
                p.id.to_string(),
                TargetKind::PostLike,
                liked.contains(&p.id),
                p.likes_count,
            )
        }));
        Ok((posts, collection))
    }

    async fn insert_ignoring_conflict(&self, table: &str, row: Row) -> SocialResult<()> {
        match self.tables.insert(table, vec![row]).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_conflict() => {
                debug!(table = %table, "Row already present");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn attach_authors(&self, posts: &mut [Post]) -> SocialResult<()> {
        let user_ids: HashSet<&str> = posts.iter().filter_map(|p| p.user_id.as_deref()).collect();
        if user_ids.is_empty() {
            return Ok(());
        }
        let rows = self
            .tables
            .select(PROFILES, &Filter::new().is_in("id", user_ids))
            .await?;
        let profiles: HashMap<String, Profile> = decode_rows::<Profile>(rows)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        for post in posts.iter_mut() {
            post.author = post
                .user_id
                .as_deref()
                .and_then(|id| profiles.get(id))
                .map(|profile| Author {
                    name: profile.full_name.clone().unwrap_or_default(),
                    avatar_url: profile.avatar_url.clone(),
                });
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileWriter for SocialRepository {
    async fn create_profile(&self, profile: &ProfileSeed) -> AuthResult<()> {
        SocialRepository::create_profile(self, profile)
            .await
            .map_err(Into::into)
    }
}

impl std::fmt::Debug for SocialRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialRepository").finish_non_exhaustive()
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> SocialResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(SocialError::from))
        .collect()
}

fn column_ids(rows: &[Row], column: &str) -> HashSet<i64> {
    rows.iter()
        .filter_map(|row| match row.get(column) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        })
        .collect()
}

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}
