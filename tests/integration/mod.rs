//! Integration tests
//!
//! End-to-end flows through `FeedSession` against the in-memory store.

pub mod feed_session_test;
