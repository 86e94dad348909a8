//! Shared Module
//!
//! This module contains the data types shared between the store
//! collaborators and the client core: posts, comments, snapshots, errors
//! and configuration.
//!
//! # Overview
//!
//! Everything here is plain data with serde derives. No type in this module
//! performs I/O.

/// Post, comment and identifier types
pub mod post;

/// Remote records, snapshots and the merged window
pub mod snapshot;

/// Shared error types
pub mod error;

/// Feed configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use post::{Comment, CommentId, CommentPreview, Post, PostId, UserId, PREVIEW_LIMIT};
pub use snapshot::{FeedSnapshot, FeedWindow, PostDocument, PostRecord, DEFAULT_WINDOW_SIZE};
pub use error::FeedError;
pub use config::{ConfigError, FeedConfig, FeedConfigBuilder};
