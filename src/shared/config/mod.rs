//! Feed configuration module
//!
//! Provides the tunables of the feed core and their validation. Values can
//! come from the builder, from a TOML document, or from the environment via
//! the client `Config` wrapper.

use crate::shared::snapshot::DEFAULT_WINDOW_SIZE;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Largest window the live query may request
pub const MAX_WINDOW_SIZE: usize = 500;

/// Default number of read-modify-write attempts before giving up
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 5;

/// Default age after which an unconfirmed optimistic patch is evicted
pub const DEFAULT_PATCH_TTL: Duration = Duration::from_secs(120);

/// Feed core configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Number of posts in the live recent window
    pub window_size: usize,
    /// Attempts for the comment preview read-modify-write on conflict
    pub max_write_retries: u32,
    /// Age after which a pending patch is evicted; `None` keeps patches
    /// until they are subsumed or rolled back
    pub patch_ttl: Option<Duration>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
            patch_ttl: Some(DEFAULT_PATCH_TTL),
        }
    }
}

impl FeedConfig {
    /// Create a new FeedConfigBuilder
    pub fn builder() -> FeedConfigBuilder {
        FeedConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
            return Err(ConfigError::OutOfRange {
                field: "window_size",
                value: self.window_size as u64,
            });
        }
        if self.max_write_retries == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_write_retries",
                value: 0,
            });
        }
        if self.patch_ttl == Some(Duration::ZERO) {
            return Err(ConfigError::OutOfRange {
                field: "patch_ttl_secs",
                value: 0,
            });
        }
        Ok(())
    }

    /// Parse a TOML document
    ///
    /// Missing keys keep their defaults. `patch_ttl_secs = 0` is rejected;
    /// omit `patch_ttl_secs` and set `evict_stale_patches = false` to
    /// disable eviction.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: FeedConfigFile =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut builder = Self::builder();
        if let Some(size) = file.window_size {
            builder = builder.window_size(size);
        }
        if let Some(retries) = file.max_write_retries {
            builder = builder.max_write_retries(retries);
        }
        if let Some(secs) = file.patch_ttl_secs {
            builder = builder.patch_ttl(Some(Duration::from_secs(secs)));
        }
        if file.evict_stale_patches == Some(false) {
            builder = builder.patch_ttl(None);
        }
        builder.build()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FeedConfigFile {
    window_size: Option<usize>,
    max_write_retries: Option<u32>,
    patch_ttl_secs: Option<u64>,
    evict_stale_patches: Option<bool>,
}

/// Builder for FeedConfig
#[derive(Debug, Default)]
pub struct FeedConfigBuilder {
    window_size: Option<usize>,
    max_write_retries: Option<u32>,
    patch_ttl: Option<Option<Duration>>,
}

impl FeedConfigBuilder {
    /// Set the live window size
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = Some(size);
        self
    }

    /// Set the read-modify-write attempt limit
    pub fn max_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = Some(retries);
        self
    }

    /// Set the stale patch eviction age
    pub fn patch_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.patch_ttl = Some(ttl);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<FeedConfig, ConfigError> {
        let defaults = FeedConfig::default();
        let config = FeedConfig {
            window_size: self.window_size.unwrap_or(defaults.window_size),
            max_write_retries: self.max_write_retries.unwrap_or(defaults.max_write_retries),
            patch_ttl: self.patch_ttl.unwrap_or(defaults.patch_ttl),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
}
