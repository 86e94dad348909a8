//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Post record and snapshot fixtures
//! - Feed session helpers that wait for the background merge
//! - Custom assertion macros

pub mod assertions;
pub mod fixtures;

// Re-export commonly used utilities
pub use fixtures::*;
