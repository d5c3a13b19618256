//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment
//! variables or deserialized settings.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigurationError, Result};

/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 100;

/// Default TTL: one hour
pub const DEFAULT_TTL_MS: u64 = 60 * 60 * 1000;

/// Cache configuration parameters.
///
/// Field names deserialize in camelCase (`capacity`, `ttlMs`, `sweepIntervalMs`)
/// so settings can be shared with the web layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Uniform expiry window in milliseconds
    pub ttl_ms: u64,
    /// Background sweep interval in milliseconds, None = lazy expiry only
    #[serde(default)]
    pub sweep_interval_ms: Option<u64>,
}

impl CacheConfig {
    /// Creates a config with the given capacity and TTL and no sweeper.
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        Self {
            capacity,
            ttl_ms,
            sweep_interval_ms: None,
        }
    }

    /// Enables the background sweeper.
    pub fn with_sweep_interval_ms(mut self, interval_ms: u64) -> Self {
        self.sweep_interval_ms = Some(interval_ms);
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 100)
    /// - `CACHE_TTL_MS` - TTL in milliseconds (default: 3600000)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: unset)
    ///
    /// Unset variables fall back to defaults. A variable that is set but does
    /// not parse is reported rather than silently ignored.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            capacity: env_number("CACHE_CAPACITY")?.unwrap_or(DEFAULT_CAPACITY),
            ttl_ms: env_number("CACHE_TTL_MS")?.unwrap_or(DEFAULT_TTL_MS),
            sweep_interval_ms: env_number("CACHE_SWEEP_INTERVAL_MS")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that capacity, TTL and sweep interval are all positive.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ConfigurationError::InvalidCapacity(self.capacity));
        }
        if self.ttl_ms == 0 {
            return Err(ConfigurationError::InvalidTtl(self.ttl_ms));
        }
        if let Some(0) = self.sweep_interval_ms {
            return Err(ConfigurationError::InvalidSweepInterval(0));
        }
        Ok(())
    }

    /// Returns the TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Returns the sweep interval as a Duration, if configured.
    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_ms.map(Duration::from_millis)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL_MS)
    }
}

fn env_number<T: std::str::FromStr>(var: &str) -> Result<Option<T>> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidEnvValue {
                var: var.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}
