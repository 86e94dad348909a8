//! Shared Error Types
//!
//! This module defines the errors surfaced by the feed core to the
//! presentation layer. Every variant is recoverable; none of them leaves the
//! merged feed in a state other than the last known good one.
//!
//! # Error Categories
//!
//! - `Unauthenticated` - an interaction was attempted with no signed-in user
//! - `PostNotFound` - the target post no longer exists remotely
//! - `MutationFailed` - transport failure or exhausted write retries
//! - `ValidationError` - local input rejected before any remote call
//! - `MalformedRecord` - a remote document is missing a required field
//! - `SubscriptionFailed` - the live feed query could not be opened
//! - `PublishFailed` - an upload or post creation failed
//! - `SerializationError` - JSON encoding or decoding failed
//!
//! # Usage
//!
//! ```rust
//! use pixfeed::shared::error::FeedError;
//!
//! let error = FeedError::validation("image", "A post needs a photo");
//! ```
use crate::shared::post::PostId;
use crate::store::StoreError;
use thiserror::Error;

/// Errors reported by the feed core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// No user is signed in
    #[error("Not signed in")]
    Unauthenticated,

    /// The post targeted by a mutation does not exist
    #[error("Post not found: {post_id}")]
    PostNotFound {
        /// The missing post
        post_id: PostId,
    },

    /// A remote mutation failed
    #[error("Mutation failed for post {post_id}: {message}")]
    MutationFailed {
        /// The post being mutated
        post_id: PostId,
        /// Human-readable error message
        message: String,
    },

    /// Local input validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A remote record is missing a required field
    #[error("Malformed record {post_id}: missing '{field}'")]
    MalformedRecord {
        /// The offending document
        post_id: PostId,
        /// The missing field
        field: &'static str,
    },

    /// The live feed query could not be opened
    #[error("Subscription failed: {message}")]
    SubscriptionFailed {
        /// Human-readable error message
        message: String,
    },

    /// An upload or post creation failed
    #[error("Publish failed: {message}")]
    PublishFailed {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },
}

impl FeedError {
    /// Create a new not-found error
    pub fn not_found(post_id: PostId) -> Self {
        Self::PostNotFound { post_id }
    }

    /// Create a new mutation failure
    pub fn mutation_failed(post_id: PostId, message: impl Into<String>) -> Self {
        Self::MutationFailed {
            post_id,
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new malformed-record error
    pub fn malformed(post_id: PostId, field: &'static str) -> Self {
        Self::MalformedRecord { post_id, field }
    }

    /// Create a new subscription failure
    pub fn subscription_failed(message: impl Into<String>) -> Self {
        Self::SubscriptionFailed {
            message: message.into(),
        }
    }

    /// Create a new publish failure
    pub fn publish_failed(message: impl Into<String>) -> Self {
        Self::PublishFailed {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Map a store failure on `post_id` into the feed taxonomy
    pub fn from_store(post_id: PostId, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::not_found(post_id),
            other => Self::mutation_failed(post_id, other.to_string()),
        }
    }

    /// Whether this failure rolled back an optimistic patch
    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::PostNotFound { .. } | Self::MutationFailed { .. })
    }
}

/// Helper trait for converting serialization errors
impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
