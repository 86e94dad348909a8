//! # Remote Feed Source
//!
//! Live view of the most recent posts, newest first, capped at the
//! configured window size. Every change inside the window produces a full
//! snapshot; consumers treat each one as authoritative and total.
//!
//! Two consumption styles are offered:
//!
//! - `subscribe` with a callback, returning a [`Subscription`] disposer
//! - `snapshots` returning a pull-based [`SnapshotStream`]

use crate::shared::config::FeedConfig;
use crate::shared::error::FeedError;
use crate::shared::snapshot::FeedSnapshot;
use crate::store::DocumentStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Pull-based sequence of snapshots
pub type SnapshotStream = UnboundedReceiverStream<FeedSnapshot>;

/// Live capped query over recent posts
#[derive(Clone)]
pub struct RemoteFeedSource {
    store: Arc<dyn DocumentStore>,
    window_size: usize,
}

impl std::fmt::Debug for RemoteFeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFeedSource")
            .field("window_size", &self.window_size)
            .finish_non_exhaustive()
    }
}

impl RemoteFeedSource {
    pub fn new(store: Arc<dyn DocumentStore>, config: &FeedConfig) -> Self {
        Self {
            store,
            window_size: config.window_size,
        }
    }

    /// Deliver every snapshot to `on_snapshot` until unsubscribed
    ///
    /// Must be called from within a tokio runtime.
    pub async fn subscribe<F>(&self, mut on_snapshot: F) -> Result<Subscription, FeedError>
    where
        F: FnMut(FeedSnapshot) + Send + 'static,
    {
        let mut rx = self
            .store
            .listen_recent(self.window_size)
            .await
            .map_err(|e| FeedError::subscription_failed(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                on_snapshot(snapshot);
            }
            tracing::debug!("[Feed] Listener closed by store");
        });
        tracing::info!("[Feed] Subscribed to recent window of {}", self.window_size);

        Ok(Subscription {
            handle,
            active: AtomicBool::new(true),
        })
    }

    /// The same live feed as a stream; dropping it releases the listener
    pub async fn snapshots(&self) -> Result<SnapshotStream, FeedError> {
        let rx = self
            .store
            .listen_recent(self.window_size)
            .await
            .map_err(|e| FeedError::subscription_failed(e.to_string()))?;
        Ok(UnboundedReceiverStream::new(rx))
    }
}

/// Handle on a callback subscription
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
    active: AtomicBool,
}

impl Subscription {
    /// Stop delivering snapshots and release the listener
    ///
    /// Safe to call more than once.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.handle.abort();
            tracing::info!("[Feed] Unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
