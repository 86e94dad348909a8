//! # Optimistic Patches
//!
//! A patch is a locally predicted change to one post, applied to the feed
//! before the store confirms it. A post carries at most one pending like
//! toggle, and a newer toggle replaces the older one. Comments are keyed by
//! their own id, so several can be pending on the same post and each one
//! retires or rolls back on its own.
//!
//! ## Lifecycle
//!
//! 1. Built from the current merged post by the commander
//! 2. Installed into the merger and re-applied on every snapshot
//! 3. Retired once a snapshot subsumes it, or rolled back on failure

use crate::shared::post::{prepend_preview, CommentId, CommentPreview, Post, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of optimistic mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchKind {
    LikeToggle,
    CommentAdd,
}

/// Key of a pending patch
///
/// `comment_id` is `None` for like toggles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatchKey {
    pub post_id: PostId,
    pub kind: PatchKind,
    pub comment_id: Option<CommentId>,
}

impl PatchKey {
    pub fn like(post_id: PostId) -> Self {
        Self {
            post_id,
            kind: PatchKind::LikeToggle,
            comment_id: None,
        }
    }

    pub fn comment(post_id: PostId, comment_id: CommentId) -> Self {
        Self {
            post_id,
            kind: PatchKind::CommentAdd,
            comment_id: Some(comment_id),
        }
    }
}

/// The predicted effect of a patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchChange {
    /// Set `user_id`'s membership in the likes to `liked`
    LikeToggle { user_id: UserId, liked: bool },
    /// Add `comment`, which brings the post to `predicted_count` comments
    CommentAdd {
        comment: CommentPreview,
        predicted_count: u64,
    },
}

/// Pending local mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimisticPatch {
    /// Unique patch id, used to roll back exactly this patch
    pub id: Uuid,
    pub post_id: PostId,
    pub change: PatchChange,
    pub created_at: DateTime<Utc>,
}

impl OptimisticPatch {
    /// Build the patch that flips `user_id`'s like on `current`
    pub fn like_toggle(current: &Post, user_id: &UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id: current.id.clone(),
            change: PatchChange::LikeToggle {
                user_id: user_id.clone(),
                liked: !current.is_liked_by(user_id),
            },
            created_at: now,
        }
    }

    /// Build the patch that adds `comment` to `current`
    ///
    /// `current` is the merged post, so comments still pending count
    /// towards the predicted total.
    pub fn comment_add(current: &Post, comment: CommentPreview, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id: current.id.clone(),
            change: PatchChange::CommentAdd {
                comment,
                predicted_count: current.comment_count + 1,
            },
            created_at: now,
        }
    }

    pub fn kind(&self) -> PatchKind {
        match self.change {
            PatchChange::LikeToggle { .. } => PatchKind::LikeToggle,
            PatchChange::CommentAdd { .. } => PatchKind::CommentAdd,
        }
    }

    pub fn key(&self) -> PatchKey {
        match &self.change {
            PatchChange::LikeToggle { .. } => PatchKey::like(self.post_id.clone()),
            PatchChange::CommentAdd { comment, .. } => {
                PatchKey::comment(self.post_id.clone(), comment.id.clone())
            }
        }
    }

    /// Whether `remote` already reflects this patch
    ///
    /// A like toggle is subsumed once the acting user's membership matches
    /// the target state. A comment is subsumed once the count reaches the
    /// predicted count, or the preview shows a comment with the same author
    /// and text.
    pub fn is_subsumed_by(&self, remote: &Post) -> bool {
        match &self.change {
            PatchChange::LikeToggle { user_id, liked } => remote.is_liked_by(user_id) == *liked,
            PatchChange::CommentAdd {
                comment,
                predicted_count,
            } => {
                remote.comment_count >= *predicted_count
                    || remote.has_preview_comment(&comment.author_id, &comment.text)
            }
        }
    }

    /// Apply the predicted delta on top of `post`
    ///
    /// Only the mutated field changes; everything else stays authoritative.
    /// A comment goes on top of whatever preview `post` already shows and
    /// adds one to its count, so pending comments stack in the order they
    /// are applied.
    pub fn apply(&self, mut post: Post) -> Post {
        match &self.change {
            PatchChange::LikeToggle { user_id, liked } => {
                if *liked {
                    post.likes.insert(user_id.clone());
                } else {
                    post.likes.remove(user_id);
                }
            }
            PatchChange::CommentAdd { comment, .. } => {
                post.comments_preview = prepend_preview(comment.clone(), &post.comments_preview);
                post.comment_count += 1;
            }
        }
        post
    }

    /// Whether the patch was created more than `max_age` before `now`
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.created_at > max_age
    }
}
