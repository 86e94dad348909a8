//! Display fields derived from a merged post.
//!
//! Everything here is a pure function of the post, the viewer and the
//! current time.

use crate::shared::post::{CommentPreview, Post, UserId, PREVIEW_LIMIT};
use chrono::{DateTime, Utc};
use serde::Serialize;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Render-ready view of one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub post_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub location: Option<String>,
    pub image_url: String,
    pub caption: String,
    /// "Nm ago", "Nh ago" or "Nd ago"
    pub age_label: String,
    /// `None` when nobody likes the post
    pub like_label: Option<String>,
    pub liked_by_viewer: bool,
    /// At most two most-recent comments
    pub comments: Vec<CommentPreview>,
    /// "View all N comments" when there are more than fit the preview
    pub view_all_label: Option<String>,
}

impl PostView {
    /// Derive the view of `post` for `viewer` at `now`
    pub fn derive(post: &Post, viewer: Option<&UserId>, now: DateTime<Utc>) -> Self {
        Self {
            post_id: post.id.to_string(),
            author_name: post.author_name.clone(),
            author_avatar: post.author_avatar.clone(),
            location: post.location.clone(),
            image_url: post.image_url.clone(),
            caption: post.caption.clone(),
            age_label: age_label(post.created_at, now),
            like_label: like_label(post.like_count()),
            liked_by_viewer: viewer.is_some_and(|v| post.is_liked_by(v)),
            comments: post.comments_preview.iter().take(PREVIEW_LIMIT).cloned().collect(),
            view_all_label: view_all_label(post.comment_count),
        }
    }
}

/// Relative age of `created_at`, truncating in every band
///
/// Timestamps in the future count as zero minutes old.
pub fn age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);
    if seconds < SECONDS_PER_HOUR {
        format!("{}m ago", seconds / SECONDS_PER_MINUTE)
    } else if seconds < SECONDS_PER_DAY {
        format!("{}h ago", seconds / SECONDS_PER_HOUR)
    } else {
        format!("{}d ago", seconds / SECONDS_PER_DAY)
    }
}

/// "1 like", "N likes", or nothing for zero
pub fn like_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        1 => Some("1 like".to_string()),
        n => Some(format!("{} likes", n)),
    }
}

/// Affordance for the full comment history
pub fn view_all_label(comment_count: u64) -> Option<String> {
    (comment_count > PREVIEW_LIMIT as u64).then(|| format!("View all {} comments", comment_count))
}
