//! Full flows: navigation, gated gestures and rollback.

use super::demo_app;
use crate::fixtures::DEMO_USER_ID;
use loop_auth::{Decision, SessionState};
use loop_interactions::{InteractionError, NoticeKind, TargetKind, ToggleOutcome};

#[tokio::test]
async fn like_survives_reload() {
    let app = demo_app();
    app.sign_in_demo().await;

    let (_, posts) = app
        .repository
        .load_post_targets(Some(DEMO_USER_ID), None)
        .await
        .unwrap();
    let post = "1".into();

    let pending = app.actions.toggle_like(&posts, &post).unwrap();
    assert!(pending.optimistic_flag());
    assert_eq!(pending.optimistic_counter(), 35);
    assert_eq!(pending.settled().await, ToggleOutcome::Committed { flag: true });

    // A fresh screen load reads the same state back.
    let (_, reloaded) = app
        .repository
        .load_post_targets(Some(DEMO_USER_ID), None)
        .await
        .unwrap();
    let target = reloaded.get(TargetKind::PostLike, &post).unwrap();
    assert!(target.flag());
    assert_eq!(target.counter(), 35);
    assert!(app.notices.is_empty());
}

#[tokio::test]
async fn anonymous_like_is_refused_without_change() {
    let app = demo_app();
    let (_, posts) = app.repository.load_post_targets(None, None).await.unwrap();
    let before = posts.snapshot();

    let err = app.actions.toggle_like(&posts, &"2".into()).unwrap_err();

    assert_eq!(err, InteractionError::AuthenticationRequired);
    assert_eq!(posts.snapshot(), before);
    let notices = app.notices.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Authentication required");
    assert_eq!(notices[0].description, "Please log in to like posts");
    assert_eq!(app.tables.rows("post_likes").len(), 1);
}

#[tokio::test]
async fn failed_join_rolls_back_and_notifies() {
    let app = demo_app();
    app.sign_in_demo().await;
    let (_, groups) = app
        .repository
        .load_group_targets(Some(DEMO_USER_ID))
        .await
        .unwrap();
    let group = "3".into();

    app.tables.set_unavailable(true);
    let pending = app.actions.toggle_membership(&groups, &group).unwrap();
    assert!(pending.optimistic_flag());
    assert_eq!(pending.optimistic_counter(), 3215);

    assert!(matches!(
        pending.settled().await,
        ToggleOutcome::Reverted {
            error: InteractionError::TransportFailure(_)
        }
    ));
    let target = groups.get(TargetKind::GroupMembership, &group).unwrap();
    assert!(!target.flag());
    assert_eq!(target.counter(), 3214);

    let notices = app.notices.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert!(notices[0].retryable);

    app.tables.set_unavailable(false);
    assert!(!app
        .repository
        .joined_group_ids(DEMO_USER_ID)
        .await
        .unwrap()
        .contains(&3));
}

#[tokio::test]
async fn join_then_leave_restores_member_count() {
    let app = demo_app();
    app.sign_in_demo().await;
    let (_, groups) = app
        .repository
        .load_group_targets(Some(DEMO_USER_ID))
        .await
        .unwrap();
    let group = "4".into();

    let join = app.actions.toggle_membership(&groups, &group).unwrap();
    let leave = app.actions.toggle_membership(&groups, &group).unwrap();
    assert!(!leave.optimistic_flag());
    assert_eq!(leave.optimistic_counter(), 1956);

    assert_eq!(join.settled().await, ToggleOutcome::Committed { flag: true });
    assert_eq!(leave.settled().await, ToggleOutcome::Committed { flag: false });

    assert_eq!(app.repository.group(4).await.unwrap().member_count, 1956);
    let target = groups.get(TargetKind::GroupMembership, &group).unwrap();
    assert!(!target.flag());
    assert_eq!(target.counter(), 1956);
}

#[tokio::test]
async fn blank_post_is_rejected() {
    let app = demo_app();
    app.sign_in_demo().await;

    let err = app.actions.create_post("   ", None).await.unwrap_err();

    assert_eq!(
        err,
        InteractionError::ValidationFailure("Post content cannot be empty".to_string())
    );
    assert_eq!(app.tables.rows("posts").len(), 3);
    assert_eq!(app.notices.len(), 1);
}

#[tokio::test]
async fn anonymous_post_is_refused() {
    let app = demo_app();

    let err = app.actions.create_post("Hello", None).await.unwrap_err();

    assert_eq!(err, InteractionError::AuthenticationRequired);
    assert_eq!(app.notices.notices()[0].description, "Please log in to post");
    assert_eq!(app.tables.rows("posts").len(), 3);
}

#[tokio::test]
async fn published_post_appears_in_group() {
    let app = demo_app();
    app.sign_in_demo().await;
    let group = app.repository.group(1).await.unwrap();

    let post = app
        .actions
        .create_post("  Roadmap review notes  ", Some(&group))
        .await
        .unwrap();
    assert_eq!(post.content, "Roadmap review notes");
    assert_eq!(post.group_label(), "Product Management Professionals");

    let notices = app.notices.notices();
    assert_eq!(notices[0].kind, NoticeKind::Info);
    assert_eq!(notices[0].description, "Your post has been published to the group");

    let posts = app.repository.group_posts(Some(1)).await.unwrap();
    assert_eq!(posts[0].id, post.id);
    assert_eq!(posts.len(), 3);
}

#[tokio::test]
async fn navigation_follows_the_session() {
    let app = demo_app();

    assert_eq!(
        app.guard.precheck("/feed"),
        Some(Decision::Redirect("/login".to_string()))
    );
    assert_eq!(app.guard.authorize("/login").await, Decision::Allow);

    app.sign_in_demo().await;
    assert_eq!(app.guard.precheck("/feed"), None);
    assert_eq!(app.guard.authorize("/feed").await, Decision::Allow);
    assert_eq!(app.guard.state(), SessionState::Authenticated);

    // Revoked elsewhere: the next check drops the cached session.
    app.auth.revoke_session();
    assert_eq!(
        app.guard.authorize("/groups").await,
        Decision::Redirect("/login".to_string())
    );
    assert!(!app.lifecycle.current().is_authenticated());
    assert!(app.actions.toggle_like(&Default::default(), &"1".into()).is_err());
}

#[tokio::test]
async fn sign_up_writes_profile_and_session() {
    let app = demo_app();

    let session = app
        .authenticator
        .sign_up("grace@loop.test", "cobol-59", "Grace Hopper")
        .await
        .unwrap();
    let user_id = session.user_id().unwrap();

    let profile = app.repository.profile(user_id).await.unwrap();
    assert_eq!(profile.full_name.as_deref(), Some("Grace Hopper"));
    assert!(profile
        .avatar_url
        .unwrap()
        .ends_with("seed=GraceHopper"));
    assert!(app.repository.joined_groups(user_id).await.unwrap().is_empty());
    assert_eq!(app.lifecycle.current(), session);
}
