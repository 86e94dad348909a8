//! Record fixtures and feed session helpers

use chrono::{Duration, Utc};
use pixfeed::client::{AuthUser, FeedSession, SessionContext};
use pixfeed::shared::{
    CommentId, CommentPreview, FeedConfig, FeedSnapshot, FeedWindow, Post, PostDocument, PostId,
    PostRecord, UserId,
};
use pixfeed::store::MemoryStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_stream::StreamExt;

/// How long helpers wait for the background merge before failing
pub const SETTLE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

/// A well-formed post record created `age_minutes` ago
pub fn record(author: &str, age_minutes: i64) -> PostRecord {
    PostRecord {
        author_id: Some(UserId::new(author)),
        author_name: Some(author.to_uppercase()),
        image_url: Some(format!("memory://posts/{}.jpg", author)),
        caption: Some(format!("photo by {}", author)),
        created_at: Some(Utc::now() - Duration::minutes(age_minutes)),
        ..PostRecord::default()
    }
}

/// A snapshot built from `(id, record)` pairs
pub fn snapshot(documents: Vec<(&str, PostRecord)>) -> FeedSnapshot {
    FeedSnapshot::new(
        documents
            .into_iter()
            .map(|(id, record)| PostDocument {
                id: PostId::new(id),
                record,
            })
            .collect(),
    )
}

/// A merged post with the given likes and comment state
pub fn post(id: &str, likes: &[&str], preview: Vec<CommentPreview>, comment_count: u64) -> Post {
    Post {
        id: PostId::new(id),
        author_id: UserId::new("author"),
        author_name: "Author".to_string(),
        author_avatar: None,
        image_url: "memory://posts/author.jpg".to_string(),
        caption: String::new(),
        location: None,
        created_at: Utc::now(),
        likes: likes.iter().map(|u| UserId::new(*u)).collect::<BTreeSet<_>>(),
        comments_preview: preview,
        comment_count,
    }
}

pub fn preview(id: &str, author: &str, text: &str) -> CommentPreview {
    CommentPreview {
        id: CommentId::new(id),
        author_id: UserId::new(author),
        author_name: author.to_string(),
        text: text.to_string(),
        created_at: None,
    }
}

pub fn alice() -> SessionContext {
    SessionContext::signed_in(AuthUser::new("alice", "Alice"))
}

/// Start a feed session over `store` as Alice
pub async fn started_feed(store: Arc<MemoryStore>, config: FeedConfig) -> (FeedSession, SessionContext) {
    let session = alice();
    let mut feed = FeedSession::new(store, session.clone(), config);
    feed.start().await.expect("feed session should start");
    (feed, session)
}

/// Wait until the merged window satisfies `predicate`
pub async fn wait_for_window<F>(feed: &FeedSession, predicate: F) -> FeedWindow
where
    F: Fn(&FeedWindow) -> bool,
{
    let mut windows = feed.windows().await;
    let found = tokio::time::timeout(SETTLE_TIMEOUT, async {
        while let Some(window) = windows.next().await {
            if predicate(&window) {
                return Some(window);
            }
        }
        None
    })
    .await;

    match found {
        Ok(Some(window)) => window,
        _ => panic!(
            "window never matched; last seen: {:?}",
            feed.current().await
        ),
    }
}

/// Wait until the number of pending patches equals `expected`
pub async fn wait_for_pending(feed: &FeedSession, expected: usize) {
    let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
    while feed.pending_patches().await != expected {
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "expected {} pending patches, still {}",
                expected,
                feed.pending_patches().await
            );
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
