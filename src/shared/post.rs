/**
 * Post and Comment Data Structures
 *
 * This module defines the feed entities shared by the store collaborators,
 * the optimistic merger and the view layer: posts, embedded comment
 * previews and full comment history entries.
 *
 * Identifiers are opaque strings assigned by the document store. They are
 * wrapped in newtypes so a post id can never be passed where a user id is
 * expected.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Maximum number of comments embedded in a post for feed display
pub const PREVIEW_LIMIT: usize = 2;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().simple().to_string())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a post document
    PostId
);
opaque_id!(
    /// Identifier of an authenticated user
    UserId
);
opaque_id!(
    /// Identifier of a comment, scoped to its parent post
    CommentId
);

/// A comment as embedded in a post's bounded preview list
///
/// The author id travels with the preview so that a pending comment can be
/// recognised in a snapshot by author and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPreview {
    /// Comment identifier
    pub id: CommentId,
    /// Author's user id
    pub author_id: UserId,
    /// Author's display name at the time of commenting
    pub author_name: String,
    /// Comment text
    pub text: String,
    /// Creation time, if the store has resolved it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A full comment history entry stored in a post's comment sub-collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub id: CommentId,
    /// Parent post
    pub post_id: PostId,
    /// Author's user id
    pub author_id: UserId,
    /// Author's display name
    pub author_name: String,
    /// Comment text, never blank
    pub text: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// The preview entry embedded in the parent post for this comment
    pub fn preview(&self) -> CommentPreview {
        CommentPreview {
            id: self.id.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            text: self.text.clone(),
            created_at: Some(self.created_at),
        }
    }
}

/// A post as rendered in the feed
///
/// `likes` is a set, so a user can never appear twice. `comments_preview`
/// holds at most [`PREVIEW_LIMIT`] entries, most recent first, and
/// `comment_count` is never below the preview length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub image_url: String,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes: BTreeSet<UserId>,
    pub comments_preview: Vec<CommentPreview>,
    pub comment_count: u64,
}

impl Post {
    /// Whether the given user currently likes this post
    pub fn is_liked_by(&self, user_id: &UserId) -> bool {
        self.likes.contains(user_id)
    }

    /// Number of distinct likers
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Whether the preview already carries a comment by `author_id` with `text`
    pub fn has_preview_comment(&self, author_id: &UserId, text: &str) -> bool {
        self.comments_preview
            .iter()
            .any(|c| &c.author_id == author_id && c.text == text)
    }
}

/// Prepend `comment` to `preview`, dropping any older copy of the same
/// comment, and truncate to [`PREVIEW_LIMIT`].
pub fn prepend_preview(comment: CommentPreview, preview: &[CommentPreview]) -> Vec<CommentPreview> {
    std::iter::once(comment.clone())
        .chain(preview.iter().filter(|c| c.id != comment.id).cloned())
        .take(PREVIEW_LIMIT)
        .collect()
}
