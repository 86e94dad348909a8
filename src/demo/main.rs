/**
 * Feed Demo Entry Point
 *
 * Runs the feed core against the in-memory store and prints the merged
 * feed as it changes: an optimistic like confirmed by the store, a like
 * rolled back while offline, and a comment reconciled across snapshots.
 */
use chrono::Utc;
use pixfeed::client::{AuthUser, Config, FeedSession, PostView, SessionContext};
use pixfeed::shared::{PostId, PostRecord, UserId};
use pixfeed::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

fn print_feed(label: &str, views: &[PostView]) {
    println!("== {} ==", label);
    for view in views {
        println!(
            "{} by {} ({}) | {} | {}",
            view.post_id,
            view.author_name,
            view.age_label,
            view.like_label.as_deref().unwrap_or("no likes"),
            view.caption
        );
        for comment in &view.comments {
            println!("    {}: {}", comment.author_name, comment.text);
        }
        if let Some(more) = &view.view_all_label {
            println!("    {}", more);
        }
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();
    tracing::info!("[STARTUP] Feed demo starting");

    let config = Config::from_env()?;
    let store = Arc::new(MemoryStore::new());
    let post_id = PostId::new("sunset");
    store
        .put_post(
            post_id.clone(),
            PostRecord {
                author_id: Some(UserId::new("bob")),
                author_name: Some("Bob".to_string()),
                image_url: Some("memory://posts/sunset.jpg".to_string()),
                caption: Some("Golden hour".to_string()),
                created_at: Some(Utc::now() - chrono::Duration::minutes(42)),
                ..PostRecord::default()
            },
        )
        .await;

    let session = SessionContext::signed_in(AuthUser::new("alice", "Alice"));
    let mut feed = FeedSession::new(store.clone(), session.clone(), config.into_feed());
    feed.start().await?;
    settle().await;
    print_feed("initial", &feed.views(Utc::now()).await);

    let commander = feed.commander();
    commander.toggle_like(&post_id).await?;
    settle().await;
    print_feed("after like", &feed.views(Utc::now()).await);

    store.set_offline(true);
    if let Err(e) = commander.toggle_like(&post_id).await {
        tracing::warn!("[Demo] Unlike failed and was rolled back: {}", e);
    }
    store.set_offline(false);
    print_feed("after failed unlike", &feed.views(Utc::now()).await);

    commander.add_comment(&post_id, "What a view!").await?;
    settle().await;
    print_feed("after comment", &feed.views(Utc::now()).await);

    println!("pending patches: {}", feed.pending_patches().await);
    session.sign_out();
    feed.stop();
    tracing::info!("[STARTUP] Feed demo finished");
    Ok(())
}
