//! Group, feed and interaction commands.

use super::require_page;
use crate::client::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use loop_interactions::{PendingToggle, TargetId, ToggleOutcome};
use loop_social::{Group, Post};

/// List groups.
pub async fn groups_list(client: &Client, joined: bool, format: &OutputFormat) -> Result<()> {
    require_page(client, "/groups").await?;
    let user_id = client.user_id();

    let (groups, targets) = client.repository.load_group_targets(user_id.as_deref()).await?;
    let member_of = |group: &Group| {
        targets
            .snapshot()
            .iter()
            .any(|t| t.id().as_str() == group.id.to_string() && t.flag())
    };
    let groups: Vec<&Group> = groups.iter().filter(|g| !joined || member_of(*g)).collect();

    match format {
        OutputFormat::Text => {
            if groups.is_empty() {
                println!("No groups found.");
                return Ok(());
            }
            output::print_heading("Groups");
            for group in groups {
                let marker = if member_of(group) { "*" } else { " " };
                println!(
                    "{} [{}] {}  ({} members, {} posts)",
                    marker, group.id, group.name, group.member_count, group.post_count
                );
                if let Some(category) = &group.category {
                    println!("      {}", category);
                }
            }
        }
        OutputFormat::Json => output::print_json(&groups),
    }
    Ok(())
}

/// Show posts, newest first.
pub async fn feed(client: &Client, group: Option<i64>, format: &OutputFormat) -> Result<()> {
    let page = match group {
        Some(id) => format!("/groups/{}", id),
        None => "/feed".to_string(),
    };
    require_page(client, &page).await?;
    let user_id = client.user_id();

    let (posts, targets) = client
        .repository
        .load_post_targets(user_id.as_deref(), group)
        .await?;

    match format {
        OutputFormat::Text => {
            if posts.is_empty() {
                println!("No posts yet.");
                return Ok(());
            }
            let liked: Vec<String> = targets
                .snapshot()
                .iter()
                .filter(|t| t.flag())
                .map(|t| t.id().to_string())
                .collect();
            for post in &posts {
                print_post(post, liked.contains(&post.id.to_string()));
            }
        }
        OutputFormat::Json => output::print_json(&posts),
    }
    Ok(())
}

fn print_post(post: &Post, liked: bool) {
    let author = post
        .author
        .as_ref()
        .map(|a| a.name.as_str())
        .unwrap_or("Unknown");
    let when = post
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    output::print_divider();
    println!("[{}] {} in {}  {}", post.id, author, post.group_label(), when);
    println!("{}", post.content);
    println!(
        "{} {} likes  {} comments  {} shares",
        if liked { "♥" } else { "♡" },
        post.likes_count,
        post.comments_count,
        post.shares_count
    );
}

/// Join a group, or leave it if already a member.
pub async fn join(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    let user_id = client.user_id();
    let (_, targets) = client.repository.load_group_targets(user_id.as_deref()).await?;

    let pending = client
        .actions
        .toggle_membership(&targets, &TargetId::from_string(id))?;
    let message = |joined: bool, members: i64| {
        if joined {
            format!("Joined group {} ({} members)", id, members)
        } else {
            format!("Left group {} ({} members)", id, members)
        }
    };
    report(pending, message, format).await
}

/// Like a post, or unlike it if already liked.
pub async fn like(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    let user_id = client.user_id();
    let (_, targets) = client
        .repository
        .load_post_targets(user_id.as_deref(), None)
        .await?;

    let pending = client
        .actions
        .toggle_like(&targets, &TargetId::from_string(id))?;
    let message = |liked: bool, likes: i64| {
        if liked {
            format!("Liked post {} ({} likes)", id, likes)
        } else {
            format!("Unliked post {} ({} likes)", id, likes)
        }
    };
    report(pending, message, format).await
}

/// Wait for a toggle's write and print how it ended.
async fn report(
    pending: PendingToggle,
    message: impl Fn(bool, i64) -> String,
    format: &OutputFormat,
) -> Result<()> {
    let counter = pending.optimistic_counter();
    match pending.settled().await {
        ToggleOutcome::Committed { flag } => {
            output::print_success(&message(flag, counter), format);
            Ok(())
        }
        ToggleOutcome::Reverted { error } => Err(error.into()),
        ToggleOutcome::Discarded => anyhow::bail!("Update was discarded"),
    }
}

/// Publish a post.
pub async fn post(
    client: &Client,
    content: &str,
    group: Option<i64>,
    format: &OutputFormat,
) -> Result<()> {
    let group = match group {
        Some(id) => Some(client.repository.group(id).await?),
        None => None,
    };

    let post = client.actions.create_post(content, group.as_ref()).await?;
    match format {
        OutputFormat::Text => println!("Post {} published", post.id),
        OutputFormat::Json => output::print_json(&post),
    }
    Ok(())
}
