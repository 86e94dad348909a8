//! # Interaction Commander
//!
//! Turns user intents into an immediate optimistic patch plus a remote
//! mutation. The patch is installed before the remote call starts, so the
//! next render already shows the change. If the remote call fails the patch
//! is rolled back and the error is returned to the caller.
//!
//! Remote mutations never compare-and-swap a cached array: likes use the
//! store's set-union / set-difference, and the comment preview is rebuilt
//! from a fresh read inside a versioned write that is retried on conflict.

use crate::client::offline::merger::OptimisticStateMerger;
use crate::client::offline::optimistic::{OptimisticPatch, PatchChange};
use crate::client::session::SessionContext;
use crate::shared::config::FeedConfig;
use crate::shared::error::FeedError;
use crate::shared::post::{prepend_preview, Comment, CommentId, PostId};
use crate::store::{DocumentStore, LikeMutation, StoreError};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Issues likes and comments on behalf of the signed-in user
#[derive(Clone)]
pub struct InteractionCommander {
    store: Arc<dyn DocumentStore>,
    merger: Arc<RwLock<OptimisticStateMerger>>,
    session: SessionContext,
    max_write_retries: u32,
}

impl std::fmt::Debug for InteractionCommander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionCommander")
            .field("session", &self.session)
            .field("max_write_retries", &self.max_write_retries)
            .finish_non_exhaustive()
    }
}

impl InteractionCommander {
    /// Create a commander writing patches into `merger`
    pub fn new(
        store: Arc<dyn DocumentStore>,
        merger: Arc<RwLock<OptimisticStateMerger>>,
        session: SessionContext,
        config: &FeedConfig,
    ) -> Self {
        Self {
            store,
            merger,
            session,
            max_write_retries: config.max_write_retries,
        }
    }

    /// Flip the signed-in user's like on `post_id`
    ///
    /// Returns the new like state.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Unauthenticated`] when nobody is signed in
    /// - [`FeedError::PostNotFound`] when the post is not in the feed or was
    ///   deleted remotely
    /// - [`FeedError::MutationFailed`] on transport failure
    ///
    /// Remote failures roll the optimistic patch back.
    pub async fn toggle_like(&self, post_id: &PostId) -> Result<bool, FeedError> {
        let user = self.session.current_user().ok_or(FeedError::Unauthenticated)?;

        let patch = {
            let mut merger = self.merger.write().await;
            let current = merger
                .post(post_id)
                .ok_or_else(|| FeedError::not_found(post_id.clone()))?;
            let patch = OptimisticPatch::like_toggle(current, &user.id, Utc::now());
            merger.install(patch.clone());
            patch
        };

        let liked = matches!(patch.change, PatchChange::LikeToggle { liked: true, .. });
        let mutation = LikeMutation::toward(user.id.clone(), liked);
        tracing::info!(
            "[Commander] {} like on {} for {}",
            if liked { "Adding" } else { "Removing" },
            post_id,
            mutation.user_id()
        );

        match self.store.update_likes(post_id, mutation).await {
            Ok(()) => Ok(liked),
            Err(err) => {
                tracing::warn!("[Commander] Like on {} failed: {}", post_id, err);
                self.rollback(&patch).await;
                Err(FeedError::from_store(post_id.clone(), err))
            }
        }
    }

    /// Add a comment by the signed-in user to `post_id`
    ///
    /// Blank text is ignored and yields `Ok(None)` without touching the
    /// feed. Otherwise returns the new comment's id.
    ///
    /// # Errors
    ///
    /// Same as [`toggle_like`](Self::toggle_like); a write conflict that
    /// persists past the retry limit surfaces as
    /// [`FeedError::MutationFailed`].
    pub async fn add_comment(&self, post_id: &PostId, text: &str) -> Result<Option<CommentId>, FeedError> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("[Commander] Ignoring blank comment on {}", post_id);
            return Ok(None);
        }
        let user = self.session.current_user().ok_or(FeedError::Unauthenticated)?;

        let comment = Comment {
            id: CommentId::generate(),
            post_id: post_id.clone(),
            author_id: user.id.clone(),
            author_name: user.display_name.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };

        let patch = {
            let mut merger = self.merger.write().await;
            let current = merger
                .post(post_id)
                .ok_or_else(|| FeedError::not_found(post_id.clone()))?;
            let patch = OptimisticPatch::comment_add(current, comment.preview(), comment.created_at);
            merger.install(patch.clone());
            patch
        };
        tracing::info!("[Commander] Adding comment {} on {}", comment.id, post_id);

        match self.persist_comment(&comment).await {
            Ok(()) => Ok(Some(comment.id)),
            Err(err) => {
                tracing::warn!("[Commander] Comment on {} failed: {}", post_id, err);
                self.rollback(&patch).await;
                Err(err)
            }
        }
    }

    /// Full comment history of a post, oldest first
    pub async fn comment_history(&self, post_id: &PostId) -> Result<Vec<Comment>, FeedError> {
        self.store
            .list_comments(post_id)
            .await
            .map_err(|e| FeedError::from_store(post_id.clone(), e))
    }

    async fn persist_comment(&self, comment: &Comment) -> Result<(), FeedError> {
        let post_id = &comment.post_id;
        self.store
            .append_comment(comment.clone())
            .await
            .map_err(|e| FeedError::from_store(post_id.clone(), e))?;

        let preview = comment.preview();
        for attempt in 1..=self.max_write_retries {
            let current = self
                .store
                .read_post(post_id)
                .await
                .map_err(|e| FeedError::from_store(post_id.clone(), e))?;

            let mut record = current.value;
            let existing = record.comments_preview.take().unwrap_or_default();
            record.comments_preview = Some(prepend_preview(preview.clone(), &existing));
            record.comment_count = Some(record.comment_count.unwrap_or(0) + 1);

            match self.store.write_post(post_id, current.version, record).await {
                Ok(_) => return Ok(()),
                Err(StoreError::Conflict { .. }) => {
                    tracing::debug!("[Commander] Preview write on {} conflicted (attempt {})", post_id, attempt);
                }
                Err(e) => return Err(FeedError::from_store(post_id.clone(), e)),
            }
        }

        Err(FeedError::mutation_failed(
            post_id.clone(),
            format!("write conflict persisted after {} attempts", self.max_write_retries),
        ))
    }

    async fn rollback(&self, patch: &OptimisticPatch) {
        self.merger.write().await.rollback(&patch.key(), patch.id);
    }
}
