//! Property-based tests

pub mod merge_proptest;
pub mod view_proptest;
