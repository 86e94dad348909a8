/**
 * Feed Snapshots and Remote Records
 *
 * The document store pushes the whole recent window on every change. This
 * module holds the raw wire shape of a post document (`PostRecord`), the
 * pushed snapshot (`FeedSnapshot`) and the adapted, render-ready window
 * (`FeedWindow`).
 *
 * # Adapting Records
 *
 * Every record field is optional on the wire. `PostRecord::adapt` applies
 * defaults for the optional ones and rejects a record that lacks an author
 * or an image, so one corrupt document can never break a whole merge pass.
 */
use crate::shared::error::FeedError;
use crate::shared::post::{CommentPreview, Post, PostId, UserId, PREVIEW_LIMIT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default number of posts in the live recent window
pub const DEFAULT_WINDOW_SIZE: usize = 50;

/// Raw post document as persisted by the document store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostRecord {
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub likes: Option<Vec<UserId>>,
    pub comments_preview: Option<Vec<CommentPreview>>,
    pub comment_count: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PostRecord {
    /// Adapt the raw record into a [`Post`]
    ///
    /// `fallback_time` stands in for a creation timestamp the store has not
    /// resolved yet.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MalformedRecord`] when the author id, author name
    /// or image reference is missing or blank.
    pub fn adapt(&self, id: &PostId, fallback_time: DateTime<Utc>) -> Result<Post, FeedError> {
        let author_id = self
            .author_id
            .clone()
            .filter(|a| !a.as_str().is_empty())
            .ok_or_else(|| FeedError::malformed(id.clone(), "author_id"))?;
        let author_name = required(&self.author_name)
            .ok_or_else(|| FeedError::malformed(id.clone(), "author_name"))?;
        let image_url = required(&self.image_url)
            .ok_or_else(|| FeedError::malformed(id.clone(), "image_url"))?;

        let likes: BTreeSet<UserId> = self.likes.iter().flatten().cloned().collect();
        let mut comments_preview = self.comments_preview.clone().unwrap_or_default();
        comments_preview.truncate(PREVIEW_LIMIT);
        let comment_count = self
            .comment_count
            .unwrap_or(0)
            .max(comments_preview.len() as u64);

        Ok(Post {
            id: id.clone(),
            author_id,
            author_name,
            author_avatar: self.author_avatar.clone().filter(|a| !a.is_empty()),
            image_url,
            caption: self.caption.clone().unwrap_or_default(),
            location: self.location.clone().filter(|l| !l.trim().is_empty()),
            created_at: self.created_at.unwrap_or(fallback_time),
            likes,
            comments_preview,
            comment_count,
        })
    }
}

impl PostRecord {
    /// Decode a record from its JSON wire form
    pub fn from_json(payload: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Encode the record as JSON
    pub fn to_json(&self) -> Result<String, FeedError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn required(field: &Option<String>) -> Option<String> {
    field.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// A post document inside a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDocument {
    pub id: PostId,
    pub record: PostRecord,
}

/// One authoritative push of the recent window
///
/// Documents are ordered newest-created-first by the store. Each snapshot
/// is total: consumers replace their state with it instead of patching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub documents: Vec<PostDocument>,
    pub received_at: DateTime<Utc>,
}

impl FeedSnapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(documents: Vec<PostDocument>) -> Self {
        Self {
            documents,
            received_at: Utc::now(),
        }
    }

    /// Whether the snapshot contains a document with the given id
    pub fn contains(&self, id: &PostId) -> bool {
        self.documents.iter().any(|d| &d.id == id)
    }
}

/// Ordered, render-ready window of posts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedWindow {
    posts: Vec<Post>,
}

impl FeedWindow {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Post> {
        self.posts.iter()
    }
}

impl<'a> IntoIterator for &'a FeedWindow {
    type Item = &'a Post;
    type IntoIter = std::slice::Iter<'a, Post>;

    fn into_iter(self) -> Self::IntoIter {
        self.posts.iter()
    }
}
