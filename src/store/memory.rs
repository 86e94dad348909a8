//! # In-Memory Store
//!
//! An in-process [`DocumentStore`] and [`BlobStore`] with the same
//! observable semantics as the hosted backend: versioned documents, atomic
//! array operations, a capped live query that pushes the whole window on
//! every change, and server-assigned timestamps.
//!
//! Faults can be injected to exercise rollback paths:
//!
//! - `set_offline(true)` makes every call fail with a transport error
//! - `inject_conflicts(n)` makes the next `n` versioned writes conflict
//! - `set_drop_writes(true)` acknowledges like updates without applying them

use crate::shared::post::{Comment, PostId};
use crate::shared::snapshot::{FeedSnapshot, PostDocument, PostRecord};
use crate::store::{BlobStore, DocumentStore, LikeMutation, StoreError, Versioned};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::{mpsc, RwLock};

/// In-process document and blob store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    offline: AtomicBool,
    drop_writes: AtomicBool,
    pending_conflicts: AtomicU32,
}

#[derive(Debug, Default)]
struct StoreState {
    posts: HashMap<PostId, StoredPost>,
    comments: HashMap<PostId, Vec<Comment>>,
    blobs: HashMap<String, Vec<u8>>,
    listeners: Vec<Listener>,
}

#[derive(Debug, Clone)]
struct StoredPost {
    version: u64,
    record: PostRecord,
}

#[derive(Debug)]
struct Listener {
    limit: usize,
    tx: mpsc::UnboundedSender<FeedSnapshot>,
    last_sent: Option<Vec<PostDocument>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate loss of connectivity
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `count` versioned writes fail with a conflict
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Acknowledge like updates without applying them
    pub fn set_drop_writes(&self, drop: bool) {
        self.drop_writes.store(drop, Ordering::SeqCst);
    }

    /// Insert or replace a post document verbatim, bypassing validation
    pub async fn put_post(&self, id: PostId, record: PostRecord) {
        let mut state = self.state.write().await;
        let version = state.posts.get(&id).map_or(1, |p| p.version + 1);
        state.posts.insert(id, StoredPost { version, record });
        state.notify();
    }

    /// Delete a post document and its comment history
    pub async fn delete_post(&self, id: &PostId) -> bool {
        let mut state = self.state.write().await;
        state.comments.remove(id);
        let removed = state.posts.remove(id).is_some();
        if removed {
            state.notify();
        }
        removed
    }

    /// Current record of a post, if any
    pub async fn post(&self, id: &PostId) -> Option<PostRecord> {
        self.state.read().await.posts.get(id).map(|p| p.record.clone())
    }

    /// Number of live listeners
    pub async fn listener_count(&self) -> usize {
        let mut state = self.state.write().await;
        state.listeners.retain(|l| !l.tx.is_closed());
        state.listeners.len()
    }

    /// Bytes stored under a blob key
    pub async fn blob(&self, key: &str) -> Option<Vec<u8>> {
        self.state.read().await.blobs.get(key).cloned()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::transport("network unreachable"));
        }
        Ok(())
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl StoreState {
    fn window(&self, limit: usize) -> Vec<PostDocument> {
        let mut docs: Vec<PostDocument> = self
            .posts
            .iter()
            .map(|(id, p)| PostDocument {
                id: id.clone(),
                record: p.record.clone(),
            })
            .collect();
        // Unresolved timestamps sort as newest, like a pending server write.
        docs.sort_by(|a, b| {
            let key = |d: &PostDocument| Reverse(d.record.created_at.unwrap_or(DateTime::<Utc>::MAX_UTC));
            key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
        });
        docs.truncate(limit);
        docs
    }

    fn notify(&mut self) {
        let windows: Vec<Vec<PostDocument>> =
            self.listeners.iter().map(|l| self.window(l.limit)).collect();

        let mut delivered = 0usize;
        for (listener, window) in self.listeners.iter_mut().zip(windows) {
            if listener.last_sent.as_ref() == Some(&window) {
                continue;
            }
            if listener.tx.send(FeedSnapshot::new(window.clone())).is_ok() {
                listener.last_sent = Some(window);
                delivered += 1;
            }
        }
        self.listeners.retain(|l| !l.tx.is_closed());
        tracing::debug!("[Store] Snapshot delivered to {} listeners", delivered);
    }

    fn post_mut(&mut self, id: &PostId) -> Result<&mut StoredPost, StoreError> {
        self.posts
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn listen_recent(
        &self,
        limit: usize,
    ) -> Result<mpsc::UnboundedReceiver<FeedSnapshot>, StoreError> {
        self.check_online()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.write().await;
        let window = state.window(limit);
        // A closed receiver here only means the caller already hung up.
        let _ = tx.send(FeedSnapshot::new(window.clone()));
        state.listeners.push(Listener {
            limit,
            tx,
            last_sent: Some(window),
        });
        tracing::info!("[Store] Listener registered (limit {})", limit);
        Ok(rx)
    }

    async fn read_post(&self, id: &PostId) -> Result<Versioned<PostRecord>, StoreError> {
        self.check_online()?;
        let state = self.state.read().await;
        state
            .posts
            .get(id)
            .map(|p| Versioned {
                version: p.version,
                value: p.record.clone(),
            })
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    async fn write_post(
        &self,
        id: &PostId,
        expected_version: u64,
        mut record: PostRecord,
    ) -> Result<u64, StoreError> {
        self.check_online()?;
        let mut state = self.state.write().await;
        let stored = state.post_mut(id)?;
        if self.take_conflict() || stored.version != expected_version {
            // A concurrent writer bumped the document.
            stored.version += 1;
            return Err(StoreError::Conflict {
                id: id.to_string(),
                expected: expected_version,
                actual: stored.version,
            });
        }
        record.updated_at = Some(Utc::now());
        stored.version += 1;
        stored.record = record;
        let version = stored.version;
        state.notify();
        Ok(version)
    }

    async fn update_likes(&self, id: &PostId, mutation: LikeMutation) -> Result<(), StoreError> {
        self.check_online()?;
        let mut state = self.state.write().await;
        let stored = state.post_mut(id)?;
        if self.drop_writes.load(Ordering::SeqCst) {
            tracing::debug!("[Store] Dropping like update by {} on {}", mutation.user_id(), id);
            return Ok(());
        }
        let likes = stored.record.likes.get_or_insert_with(Vec::new);
        match &mutation {
            LikeMutation::Union(user) => {
                if !likes.contains(user) {
                    likes.push(user.clone());
                }
            }
            LikeMutation::Difference(user) => likes.retain(|l| l != user),
        }
        stored.record.updated_at = Some(Utc::now());
        stored.version += 1;
        state.notify();
        Ok(())
    }

    async fn append_comment(&self, mut comment: Comment) -> Result<(), StoreError> {
        self.check_online()?;
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(StoreError::not_found(comment.post_id.as_str()));
        }
        comment.created_at = Utc::now();
        state
            .comments
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
        Ok(())
    }

    async fn create_post(&self, mut record: PostRecord) -> Result<PostId, StoreError> {
        self.check_online()?;
        let id = PostId::generate();
        let now = Utc::now();
        record.created_at = Some(now);
        record.updated_at = Some(now);
        let mut state = self.state.write().await;
        state.posts.insert(id.clone(), StoredPost { version: 1, record });
        state.notify();
        tracing::info!("[Store] Created post {}", id);
        Ok(id)
    }

    async fn list_comments(&self, id: &PostId) -> Result<Vec<Comment>, StoreError> {
        self.check_online()?;
        let state = self.state.read().await;
        if !state.posts.contains_key(id) {
            return Err(StoreError::not_found(id.as_str()));
        }
        Ok(state.comments.get(id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        self.check_online()?;
        let mut state = self.state.write().await;
        state.blobs.insert(key.to_string(), bytes);
        Ok(format!("memory://{}", key))
    }
}
