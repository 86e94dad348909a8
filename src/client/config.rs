use crate::shared::config::{ConfigError, FeedConfig, FeedConfigBuilder};
use std::time::Duration;

const ENV_WINDOW_SIZE: &str = "PIXFEED_WINDOW_SIZE";
const ENV_PATCH_TTL_SECS: &str = "PIXFEED_PATCH_TTL_SECS";
const ENV_MAX_WRITE_RETRIES: &str = "PIXFEED_MAX_WRITE_RETRIES";

/// Client configuration wrapper.
///
/// Layers environment overrides on top of a [`FeedConfigBuilder`].
/// `PIXFEED_PATCH_TTL_SECS=off` disables stale patch eviction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    feed: FeedConfig,
}

impl Config {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(FeedConfig::builder(), |key| std::env::var(key).ok())
    }

    pub fn with_builder(builder: FeedConfigBuilder) -> Result<Self, ConfigError> {
        Self::from_lookup(builder, |key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup` to `builder`
    pub fn from_lookup<F>(mut builder: FeedConfigBuilder, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_WINDOW_SIZE) {
            builder = builder.window_size(parse(ENV_WINDOW_SIZE, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MAX_WRITE_RETRIES) {
            builder = builder.max_write_retries(parse(ENV_MAX_WRITE_RETRIES, &raw)?);
        }
        if let Some(raw) = lookup(ENV_PATCH_TTL_SECS) {
            let ttl = if raw.trim().eq_ignore_ascii_case("off") {
                None
            } else {
                Some(Duration::from_secs(parse(ENV_PATCH_TTL_SECS, &raw)?))
            };
            builder = builder.patch_ttl(ttl);
        }

        let feed = builder.build()?;
        tracing::debug!("[Config] Loaded {:?}", feed);
        Ok(Self { feed })
    }

    pub fn feed(&self) -> &FeedConfig {
        &self.feed
    }

    pub fn into_feed(self) -> FeedConfig {
        self.feed
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
