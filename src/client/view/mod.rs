//! Presentation derivation for the feed.

pub mod post_view;

pub use post_view::{age_label, like_label, view_all_label, PostView};
