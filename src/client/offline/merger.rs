//! # Optimistic State Merger
//!
//! Reconciles pending optimistic patches with the authoritative snapshots
//! pushed by the store.
//!
//! [`merge`] is the pure core: given one snapshot and the pending patch
//! map it produces the merged window plus the patches the snapshot retired
//! or orphaned. [`OptimisticStateMerger`] owns the pending map and the last
//! snapshot, feeds them through [`merge`] whenever either changes, and is
//! the only place patches live.
//!
//! ## Rules
//!
//! - Remote fields are authoritative except the one a live patch mutates
//! - A patch the snapshot already reflects is retired and not applied
//! - Pending comments on one post stack in the order they were made, so
//!   the newest ends up on top of the preview and each adds one to the
//!   remote count
//! - A patch whose post is absent from the snapshot is dropped
//! - A malformed record is left out of the window; its patches stay pending

use crate::client::offline::optimistic::{OptimisticPatch, PatchChange, PatchKey};
use crate::shared::post::{Post, PostId};
use crate::shared::snapshot::{FeedSnapshot, FeedWindow};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::watch;
use uuid::Uuid;

/// Result of one merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The merged window, in snapshot order
    pub window: FeedWindow,
    /// Patches the snapshot already reflects
    pub retired: Vec<PatchKey>,
    /// Patches whose post is no longer in the snapshot
    pub orphaned: Vec<PatchKey>,
    /// Documents dropped because a required field was missing
    pub malformed: Vec<PostId>,
}

/// Merge `snapshot` with `pending` without touching either
pub fn merge(snapshot: &FeedSnapshot, pending: &HashMap<PatchKey, OptimisticPatch>) -> MergeOutcome {
    let mut by_post: HashMap<&PostId, Vec<&OptimisticPatch>> = HashMap::new();
    for patch in pending.values() {
        by_post.entry(&patch.post_id).or_default().push(patch);
    }
    for patches in by_post.values_mut() {
        patches.sort_by(|a, b| {
            a.kind()
                .cmp(&b.kind())
                .then(a.created_at.cmp(&b.created_at))
                .then(stack_position(a).cmp(&stack_position(b)))
                .then(a.id.cmp(&b.id))
        });
    }

    let mut outcome = MergeOutcome::default();
    let mut posts = Vec::with_capacity(snapshot.documents.len());

    for doc in &snapshot.documents {
        let remote = match doc.record.adapt(&doc.id, snapshot.received_at) {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!("[Merger] Dropping record: {}", e);
                outcome.malformed.push(doc.id.clone());
                continue;
            }
        };

        let mut merged = remote.clone();
        for patch in by_post.get(&doc.id).into_iter().flatten() {
            if patch.is_subsumed_by(&remote) {
                outcome.retired.push(patch.key());
            } else {
                merged = patch.apply(merged);
            }
        }
        posts.push(merged);
    }

    outcome.orphaned = pending
        .keys()
        .filter(|key| !snapshot.contains(&key.post_id))
        .cloned()
        .collect();
    outcome.retired.sort();
    outcome.orphaned.sort();
    outcome.window = FeedWindow::new(posts);
    outcome
}

/// Orders comments made within the same clock tick
///
/// Each one is built on the view that already shows the previous one, so
/// its predicted count is higher.
fn stack_position(patch: &OptimisticPatch) -> u64 {
    match &patch.change {
        PatchChange::CommentAdd { predicted_count, .. } => *predicted_count,
        PatchChange::LikeToggle { .. } => 0,
    }
}

/// Owner of the pending patch map and the merged feed
///
/// Every change to the merged window is published on a watch channel, so
/// a patch installed by a commander reaches the view without waiting for
/// the next snapshot.
#[derive(Debug)]
pub struct OptimisticStateMerger {
    pending: HashMap<PatchKey, OptimisticPatch>,
    last_snapshot: Option<FeedSnapshot>,
    current: FeedWindow,
    published: watch::Sender<FeedWindow>,
}

impl Default for OptimisticStateMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimisticStateMerger {
    pub fn new() -> Self {
        let (published, _rx) = watch::channel(FeedWindow::default());
        Self {
            pending: HashMap::new(),
            last_snapshot: None,
            current: FeedWindow::default(),
            published,
        }
    }

    /// Receiver of every merged window this merger produces
    pub fn watch(&self) -> watch::Receiver<FeedWindow> {
        self.published.subscribe()
    }

    /// Replace the authoritative state and re-merge pending patches
    pub fn apply_snapshot(&mut self, snapshot: FeedSnapshot) -> FeedWindow {
        tracing::debug!(
            "[Merger] Snapshot with {} documents, {} patches pending",
            snapshot.documents.len(),
            self.pending.len()
        );
        self.last_snapshot = Some(snapshot);
        self.recompute();
        self.current.clone()
    }

    /// Install a patch, replacing any pending patch with the same key
    ///
    /// Only like toggles share a key; every comment gets its own slot.
    pub fn install(&mut self, patch: OptimisticPatch) -> FeedWindow {
        tracing::debug!("[Merger] Installing {:?} patch on {}", patch.kind(), patch.post_id);
        self.pending.insert(patch.key(), patch);
        self.recompute();
        self.current.clone()
    }

    /// Remove the patch `patch_id` if it is still the one under `key`
    ///
    /// A newer like toggle that replaced it is left alone, as are other
    /// pending comments on the same post. Returns whether a patch was
    /// removed.
    pub fn rollback(&mut self, key: &PatchKey, patch_id: Uuid) -> bool {
        let matches = self.pending.get(key).is_some_and(|p| p.id == patch_id);
        if matches {
            self.pending.remove(key);
            tracing::info!("[Merger] Rolled back {:?} patch on {}", key.kind, key.post_id);
            self.recompute();
        }
        matches
    }

    /// Evict patches older than `max_age`, returning how many were dropped
    pub fn evict_stale(&mut self, now: DateTime<Utc>, max_age: chrono::Duration) -> usize {
        let before = self.pending.len();
        self.pending.retain(|key, patch| {
            let keep = !patch.is_stale(now, max_age);
            if !keep {
                tracing::warn!("[Merger] Evicting stale {:?} patch on {}", key.kind, key.post_id);
            }
            keep
        });
        let evicted = before - self.pending.len();
        if evicted > 0 {
            self.recompute();
        }
        evicted
    }

    /// Drop every pending patch, e.g. when the signed-in user changes
    pub fn clear_pending(&mut self) {
        self.pending.clear();
        self.recompute();
    }

    /// The merged window as of the last snapshot and pending patches
    pub fn current(&self) -> &FeedWindow {
        &self.current
    }

    /// A merged post by id
    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.current.get(id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: &PatchKey) -> bool {
        self.pending.contains_key(key)
    }

    fn recompute(&mut self) {
        let Some(snapshot) = &self.last_snapshot else {
            return;
        };
        let outcome = merge(snapshot, &self.pending);
        for key in &outcome.retired {
            tracing::debug!("[Merger] Retired {:?} patch on {}", key.kind, key.post_id);
            self.pending.remove(key);
        }
        for key in &outcome.orphaned {
            tracing::debug!("[Merger] Dropped orphaned {:?} patch on {}", key.kind, key.post_id);
            self.pending.remove(key);
        }
        self.current = outcome.window;
        self.published.send_if_modified(|published| {
            if *published == self.current {
                return false;
            }
            *published = self.current.clone();
            true
        });
    }
}
