//! Feed session lifecycle tests
//!
//! Tests for the live window, malformed records and the background merge
//! loop's housekeeping.

use crate::common::*;
use pixfeed::client::FeedSession;
use pixfeed::shared::{FeedConfig, PostId, PostRecord};
use pixfeed::store::MemoryStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn test_feed_shows_newest_first() {
    let store = Arc::new(MemoryStore::new());
    store.put_post(PostId::new("old"), record("bob", 30)).await;
    store.put_post(PostId::new("new"), record("carol", 1)).await;

    let (feed, _session) = started_feed(store, FeedConfig::default()).await;
    let window = wait_for_window(&feed, |w| w.len() == 2).await;

    let ids: Vec<&str> = window.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[tokio::test]
async fn test_window_is_capped() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..4 {
        store.put_post(PostId::new(format!("p{}", i)), record("bob", 10 - i)).await;
    }
    let config = crate::assert_ok!(FeedConfig::builder().window_size(2).build());

    let (feed, _session) = started_feed(store, config).await;
    let window = wait_for_window(&feed, |w| !w.is_empty()).await;
    let ids: Vec<&str> = window.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p3", "p2"]);
}

#[tokio::test]
async fn test_new_post_appears_live() {
    let store = Arc::new(MemoryStore::new());
    let (feed, _session) = started_feed(store.clone(), FeedConfig::default()).await;
    wait_for_window(&feed, |w| w.is_empty()).await;

    store.put_post(PostId::new("p1"), record("bob", 0)).await;
    let window = wait_for_window(&feed, |w| w.len() == 1).await;
    assert_eq!(window.posts()[0].author_name, "BOB");
}

#[tokio::test]
async fn test_malformed_record_is_left_out() {
    let store = Arc::new(MemoryStore::new());
    store.put_post(PostId::new("good"), record("bob", 5)).await;
    store
        .put_post(
            PostId::new("broken"),
            PostRecord {
                image_url: None,
                ..record("eve", 1)
            },
        )
        .await;

    let (feed, _session) = started_feed(store, FeedConfig::default()).await;
    let window = wait_for_window(&feed, |w| !w.is_empty()).await;
    assert_eq!(window.len(), 1);
    assert!(window.get(&PostId::new("broken")).is_none());
}

#[tokio::test]
async fn test_deleted_post_leaves_window() {
    let store = Arc::new(MemoryStore::new());
    store.put_post(PostId::new("p1"), record("bob", 5)).await;
    store.put_post(PostId::new("p2"), record("carol", 3)).await;
    let (feed, _session) = started_feed(store.clone(), FeedConfig::default()).await;
    wait_for_window(&feed, |w| w.len() == 2).await;

    assert!(store.delete_post(&PostId::new("p1")).await);
    let window = wait_for_window(&feed, |w| w.len() == 1).await;
    assert!(window.get(&PostId::new("p2")).is_some());
}

#[tokio::test]
async fn test_views_follow_viewer() {
    let store = Arc::new(MemoryStore::new());
    store
        .put_post(
            PostId::new("p1"),
            PostRecord {
                likes: Some(vec!["alice".into(), "bob".into()]),
                comment_count: Some(7),
                ..record("bob", 90)
            },
        )
        .await;
    let (feed, session) = started_feed(store, FeedConfig::default()).await;
    wait_for_window(&feed, |w| w.len() == 1).await;

    let views = feed.views(chrono::Utc::now()).await;
    assert_eq!(views[0].age_label, "1h ago");
    assert_eq!(views[0].like_label.as_deref(), Some("2 likes"));
    assert!(views[0].liked_by_viewer);
    assert_eq!(views[0].view_all_label.as_deref(), Some("View all 7 comments"));

    session.sign_out();
    let views = feed.views(chrono::Utc::now()).await;
    assert!(!views[0].liked_by_viewer);
}

#[tokio::test]
async fn test_start_and_stop() {
    let store = Arc::new(MemoryStore::new());
    let mut feed = FeedSession::new(store.clone(), alice(), FeedConfig::default());
    assert!(!feed.is_running());

    crate::assert_ok!(feed.start().await);
    crate::assert_ok!(feed.start().await);
    assert!(feed.is_running());
    assert_eq!(store.listener_count().await, 1);

    feed.stop();
    assert!(!feed.is_running());
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(store.listener_count().await, 0);
}

#[tokio::test]
async fn test_start_offline_fails() {
    let store = Arc::new(MemoryStore::new());
    store.set_offline(true);
    let mut feed = FeedSession::new(store, alice(), FeedConfig::default());
    crate::assert_err!(
        feed.start().await,
        pixfeed::shared::FeedError::SubscriptionFailed { .. }
    );
    assert!(!feed.is_running());
}
