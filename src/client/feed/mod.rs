//! # Feed Session
//!
//! Wires the live feed to the optimistic merger and exposes the merged
//! result to the view layer.
//!
//! ## Architecture
//!
//! - **Source**: `RemoteFeedSource` streams authoritative snapshots
//! - **Merger**: shared `OptimisticStateMerger` holding pending patches
//! - **Commander**: `InteractionCommander` bound to the same merger
//! - **Background task**: applies each snapshot, evicts stale patches and
//!   clears pending patches whenever the signed-in user changes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pixfeed::client::feed::FeedSession;
//! use pixfeed::client::session::{AuthUser, SessionContext};
//! use pixfeed::shared::FeedConfig;
//! use pixfeed::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), pixfeed::shared::FeedError> {
//! let session = SessionContext::signed_in(AuthUser::new("u1", "Alice"));
//! let mut feed = FeedSession::new(Arc::new(MemoryStore::new()), session, FeedConfig::default());
//! feed.start().await?;
//!
//! let _views = feed.views(chrono::Utc::now()).await;
//! # Ok(())
//! # }
//! ```

pub mod source;

pub use source::{RemoteFeedSource, SnapshotStream, Subscription};

use crate::client::offline::{InteractionCommander, OptimisticStateMerger};
use crate::client::session::{AuthUser, SessionContext};
use crate::client::view::PostView;
use crate::shared::config::FeedConfig;
use crate::shared::error::FeedError;
use crate::shared::post::UserId;
use crate::shared::snapshot::FeedWindow;
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

/// Live, merged feed for one signed-in client
#[derive(Debug)]
pub struct FeedSession {
    source: RemoteFeedSource,
    merger: Arc<RwLock<OptimisticStateMerger>>,
    commander: InteractionCommander,
    session: SessionContext,
    config: FeedConfig,
    /// Background snapshot task handle
    background_task: Option<JoinHandle<()>>,
}

impl FeedSession {
    /// Create a stopped feed session
    pub fn new(store: Arc<dyn DocumentStore>, session: SessionContext, config: FeedConfig) -> Self {
        let merger = Arc::new(RwLock::new(OptimisticStateMerger::new()));
        let source = RemoteFeedSource::new(store.clone(), &config);
        let commander = InteractionCommander::new(store, merger.clone(), session.clone(), &config);
        Self {
            source,
            merger,
            commander,
            session,
            config,
            background_task: None,
        }
    }

    /// Open the live query and start merging snapshots
    ///
    /// Starting a running session is a no-op.
    pub async fn start(&mut self) -> Result<(), FeedError> {
        if self.is_running() {
            return Ok(());
        }

        let snapshots = self.source.snapshots().await?;
        let merger = Arc::clone(&self.merger);
        let mut session_rx = self.session.watch();
        let signed_in_as = session_rx.borrow_and_update().as_ref().map(|u| u.id.clone());
        let patch_ttl = self.config.patch_ttl;

        let handle = tokio::spawn(async move {
            Self::background_merge_loop(snapshots, session_rx, signed_in_as, merger, patch_ttl).await;
        });
        self.background_task = Some(handle);
        tracing::info!("[Feed] Session started");
        Ok(())
    }

    /// Stop merging snapshots and release the live query
    pub fn stop(&mut self) {
        if let Some(handle) = self.background_task.take() {
            handle.abort();
            tracing::info!("[Feed] Session stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.background_task.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Commander issuing likes and comments into this feed
    pub fn commander(&self) -> InteractionCommander {
        self.commander.clone()
    }

    /// The merged window right now
    pub async fn current(&self) -> FeedWindow {
        self.merger.read().await.current().clone()
    }

    /// Every merged window from now on, starting with the current one
    pub async fn windows(&self) -> WatchStream<FeedWindow> {
        WatchStream::new(self.merger.read().await.watch())
    }

    /// Render-ready views of the merged window for the signed-in viewer
    pub async fn views(&self, now: DateTime<Utc>) -> Vec<PostView> {
        let viewer = self.session.current_user().map(|u| u.id);
        self.merger
            .read()
            .await
            .current()
            .iter()
            .map(|post| PostView::derive(post, viewer.as_ref(), now))
            .collect()
    }

    /// Number of optimistic patches awaiting confirmation
    pub async fn pending_patches(&self) -> usize {
        self.merger.read().await.pending_len()
    }

    async fn background_merge_loop(
        mut snapshots: SnapshotStream,
        mut session_rx: watch::Receiver<Option<AuthUser>>,
        mut signed_in_as: Option<UserId>,
        merger: Arc<RwLock<OptimisticStateMerger>>,
        patch_ttl: Option<Duration>,
    ) {
        let max_age = patch_ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok());
        let mut watching_session = true;

        loop {
            tokio::select! {
                next = snapshots.next() => {
                    let Some(snapshot) = next else {
                        tracing::warn!("[Feed] Snapshot stream ended");
                        break;
                    };
                    let mut merger = merger.write().await;
                    if let Some(max_age) = max_age {
                        merger.evict_stale(Utc::now(), max_age);
                    }
                    let window = merger.apply_snapshot(snapshot);
                    tracing::debug!("[Feed] Merged window of {} posts", window.len());
                }
                changed = session_rx.changed(), if watching_session => {
                    if changed.is_err() {
                        watching_session = false;
                        continue;
                    }
                    // Profile edits keep the id and leave patches alone.
                    let user_id = session_rx.borrow_and_update().as_ref().map(|u| u.id.clone());
                    if user_id != signed_in_as {
                        let previous = std::mem::replace(&mut signed_in_as, user_id);
                        merger.write().await.clear_pending();
                        match (&previous, &signed_in_as) {
                            (Some(prev), Some(next)) => tracing::info!(
                                "[Feed] Cleared pending patches of {} after switching to {}",
                                prev,
                                next
                            ),
                            _ => tracing::info!("[Feed] Cleared pending patches after session change"),
                        }
                    }
                }
            }
        }
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.stop();
    }
}
