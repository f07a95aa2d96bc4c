//! Configuration Module
//!
//! Handles the cache engine's configuration surface: capacity hint, sweep
//! interval and default TTL. Non-positive values fall back to defaults.

use std::env;
use std::time::Duration;

// == Defaults ==
/// Default initial capacity of the key map
pub const DEFAULT_CAPACITY: usize = 10;

/// Default interval between expiration sweeps (60 seconds)
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60 * 1000;

/// Default entry lifetime (10 minutes)
pub const DEFAULT_TTL_MS: u64 = 10 * 60 * 1000;

/// Cache engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Initial capacity hint for the key map
    pub capacity: usize,
    /// Interval between expiration sweeps
    pub sweep_interval: Duration,
    /// Lifetime given to entries admitted without an explicit TTL
    pub default_ttl: Duration,
}

impl CacheConfig {
    /// Builds a config from raw values, replacing each non-positive input
    /// independently with its default.
    ///
    /// # Arguments
    /// * `capacity` - Initial map capacity (default: 10)
    /// * `sweep_interval_ms` - Sweep interval in milliseconds (default: 60 000)
    /// * `ttl_ms` - Default TTL in milliseconds (default: 600 000)
    pub fn new(capacity: i64, sweep_interval_ms: i64, ttl_ms: i64) -> Self {
        Self {
            capacity: positive_or(capacity, DEFAULT_CAPACITY as u64) as usize,
            sweep_interval: Duration::from_millis(positive_or(
                sweep_interval_ms,
                DEFAULT_SWEEP_INTERVAL_MS,
            )),
            default_ttl: Duration::from_millis(positive_or(ttl_ms, DEFAULT_TTL_MS)),
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMCACHE_CAPACITY` - Initial map capacity (default: 10)
    /// - `MEMCACHE_SWEEP_INTERVAL_MS` - Sweep interval in ms (default: 60000)
    /// - `MEMCACHE_TTL_MS` - Default TTL in ms (default: 600000)
    ///
    /// Missing, unparseable or non-positive values use the default.
    pub fn from_env() -> Self {
        Self::new(
            env_i64("MEMCACHE_CAPACITY"),
            env_i64("MEMCACHE_SWEEP_INTERVAL_MS"),
            env_i64("MEMCACHE_TTL_MS"),
        )
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
        }
    }
}

fn positive_or(value: i64, default: u64) -> u64 {
    if value > 0 {
        value as u64
    } else {
        default
    }
}

fn env_i64(name: &str) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
