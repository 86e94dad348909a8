//! pixfeed - Feed Synchronization Core
//!
//! The client-side core of a photo-sharing feed. A live, capped query over
//! recent posts delivers authoritative snapshots; the user's likes and
//! comments show up immediately as optimistic patches that are merged on top
//! of every snapshot until the backend confirms them or they fail.
//!
//! # Module Structure
//!
//! - **`shared`** - Plain data shared by every layer
//!   - Posts, comments and identifiers
//!   - Remote records, snapshots and the merged window
//!   - Error types and configuration
//!
//! - **`store`** - Remote collaborators
//!   - `DocumentStore` and `BlobStore` traits
//!   - `MemoryStore`, an in-process implementation with fault injection
//!
//! - **`client`** - Device-side core
//!   - `FeedSession` wiring the live feed to the optimistic merger
//!   - `InteractionCommander` for likes and comments
//!   - `PostPublisher` and `ProfileEditor`
//!   - `PostView` derivation
//!
//! # Feature Flags
//!
//! - **`cli`** - builds the `feed-demo` binary with a tracing subscriber
//!
//! # Usage
//!
//! ```rust,no_run
//! use pixfeed::client::{AuthUser, FeedSession, SessionContext};
//! use pixfeed::shared::FeedConfig;
//! use pixfeed::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), pixfeed::shared::FeedError> {
//! let store = Arc::new(MemoryStore::new());
//! let session = SessionContext::signed_in(AuthUser::new("u1", "Alice"));
//! let mut feed = FeedSession::new(store, session, FeedConfig::default());
//! feed.start().await?;
//!
//! let commander = feed.commander();
//! commander.toggle_like(&"p1".into()).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod shared;
pub mod store;
