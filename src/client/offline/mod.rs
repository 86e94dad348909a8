//! # Optimistic Interaction System
//!
//! Provides optimistic UI updates for likes and comments and reconciles them
//! with the authoritative feed pushed by the store.
//!
//! ## Architecture
//!
//! - **Optimistic patches**: predicted per-post changes; one like toggle per
//!   post, one slot per pending comment
//! - **Merger**: owns the pending patches and merges them into each snapshot
//! - **Commander**: installs patches and issues the remote mutations
//!
//! ## Key Components
//!
//! - `optimistic.rs`: patch construction, subsumption and application
//! - `merger.rs`: the pure merge pass and the stateful merger
//! - `commander.rs`: like toggles and comment adds with rollback
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pixfeed::client::offline::InteractionCommander;
//! # async fn example(commander: InteractionCommander) -> Result<(), pixfeed::shared::FeedError> {
//! let post_id = "p1".into();
//! let _liked = commander.toggle_like(&post_id).await?;
//! commander.add_comment(&post_id, "Nice shot!").await?;
//! # Ok(())
//! # }
//! ```

pub mod commander;
pub mod merger;
pub mod optimistic;

// Re-export main types
pub use commander::InteractionCommander;
pub use merger::{merge, MergeOutcome, OptimisticStateMerger};
pub use optimistic::{OptimisticPatch, PatchChange, PatchKey, PatchKind};
