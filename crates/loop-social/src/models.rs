//! Row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub member_count: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub post_count: i64,
}

/// Display name and avatar of a post's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub likes_count: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub comments_count: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub shares_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Filled from `profiles` after the post rows are read.
    #[serde(default, skip_serializing)]
    pub author: Option<Author>,
}

impl Post {
    pub fn group_label(&self) -> &str {
        self.group_name.as_deref().unwrap_or("Unknown Group")
    }
}

/// A post about to be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl NewPost {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            group_id: None,
            group_name: None,
        }
    }

    pub fn in_group(mut self, group: &Group) -> Self {
        self.group_id = Some(group.id);
        self.group_name = Some(group.name.clone());
        self
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_nullable_counts() {
        let group: Group = serde_json::from_value(json!({
            "id": 3,
            "name": "Software Engineering Hub",
            "member_count": null,
            "created_by": "someone"
        }))
        .unwrap();
        assert_eq!(group.member_count, 0);
        assert_eq!(group.post_count, 0);
        assert!(group.description.is_none());
    }

    #[test]
    fn test_post_defaults() {
        let post: Post = serde_json::from_value(json!({
            "id": 1,
            "content": "hello",
            "created_at": "2026-02-01T10:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(post.group_label(), "Unknown Group");
        assert_eq!(post.likes_count, 0);
        assert!(post.created_at.is_some());
    }

    #[test]
    fn test_new_post_in_group() {
        let group: Group = serde_json::from_value(json!({"id": 2, "name": "UX/UI Design Network"})).unwrap();
        let post = NewPost::new("Wireframes attached").in_group(&group);
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["group_id"], json!(2));
        assert_eq!(value["group_name"], json!("UX/UI Design Network"));
    }
}
