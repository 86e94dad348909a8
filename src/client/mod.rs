//! Client Core
//!
//! Everything that runs on the device: the signed-in session, the live feed
//! with its optimistic overlay, interaction commands, publishing flows and
//! the presentation derivation.

/// Client configuration from the environment
pub mod config;

/// Live feed session and remote source
pub mod feed;

/// Optimistic patches, merging and interaction commands
pub mod offline;

/// Post creation and profile editing
pub mod publish;

/// Signed-in user handle
pub mod session;

/// Render-ready post views
pub mod view;

pub use config::Config;
pub use feed::{FeedSession, RemoteFeedSource, Subscription};
pub use offline::{InteractionCommander, OptimisticStateMerger};
pub use publish::{ImageSource, PostDraft, PostPublisher, ProfileEditor};
pub use session::{AuthUser, SessionContext};
pub use view::PostView;
