//! # Remote Store Collaborators
//!
//! The feed core never owns durable state. It talks to a document store and
//! a blob store through the traits in this module, which mirror the
//! primitives a managed backend-as-a-service offers:
//!
//! - a live, server-sorted, capped query over post documents
//! - an atomic read-modify-write on one document (versioned write)
//! - atomic set-union / set-difference on the likes array
//! - an append-only comment sub-collection
//! - blob upload returning a durable reference
//!
//! Concurrent writers are reconciled by these primitives, never by the
//! client comparing cached arrays.
//!
//! `memory` provides an in-process implementation with fault injection.

pub mod memory;

pub use memory::MemoryStore;

use crate::shared::post::{Comment, PostId, UserId};
use crate::shared::snapshot::{FeedSnapshot, PostRecord};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised by store collaborators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed document does not exist
    #[error("document not found: {id}")]
    NotFound { id: String },

    /// A versioned write lost a race with another writer
    #[error("write conflict on {id}: expected version {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Network or backend failure
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// A document together with the version used for conditional writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Atomic membership change on a post's likes array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeMutation {
    /// Add the user if absent
    Union(UserId),
    /// Remove the user if present
    Difference(UserId),
}

impl LikeMutation {
    /// The mutation that moves `user_id` into the `liked` state
    pub fn toward(user_id: UserId, liked: bool) -> Self {
        if liked {
            Self::Union(user_id)
        } else {
            Self::Difference(user_id)
        }
    }

    pub fn user_id(&self) -> &UserId {
        match self {
            Self::Union(id) | Self::Difference(id) => id,
        }
    }
}

/// Document database collaborator
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a live query over the `limit` most recently created posts
    ///
    /// The current window is delivered immediately, then again after every
    /// change inside it. Dropping the receiver releases the listener.
    async fn listen_recent(
        &self,
        limit: usize,
    ) -> Result<mpsc::UnboundedReceiver<FeedSnapshot>, StoreError>;

    /// Read a post document and its current version
    async fn read_post(&self, id: &PostId) -> Result<Versioned<PostRecord>, StoreError>;

    /// Replace a post document if its version still equals `expected_version`
    ///
    /// Returns the new version, or [`StoreError::Conflict`] when another
    /// writer got there first.
    async fn write_post(
        &self,
        id: &PostId,
        expected_version: u64,
        record: PostRecord,
    ) -> Result<u64, StoreError>;

    /// Apply an atomic set operation to the likes array
    async fn update_likes(&self, id: &PostId, mutation: LikeMutation) -> Result<(), StoreError>;

    /// Append a comment to its post's history sub-collection
    async fn append_comment(&self, comment: Comment) -> Result<(), StoreError>;

    /// Create a new post document, returning its generated id
    async fn create_post(&self, record: PostRecord) -> Result<PostId, StoreError>;

    /// Full comment history of a post, oldest first
    async fn list_comments(&self, id: &PostId) -> Result<Vec<Comment>, StoreError>;
}

/// Object storage collaborator
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `bytes` under `key`, returning a durable fetchable reference
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<String, StoreError>;
}
