//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Calculation cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// TTL for unclassified, drifting data (e.g. planetary positions)
    pub ttl_short: Duration,
    /// TTL for partner/shared calculation data (e.g. compatibility scores)
    pub ttl_default: Duration,
    /// TTL for the user's own stable data (e.g. birth data, dasha periods)
    pub ttl_long: Duration,
    /// Background expiry sweep interval
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `TTL_SHORT_SECS` - Short TTL in seconds (default: 3600, one hour)
    /// - `TTL_DEFAULT_SECS` - Default TTL in seconds (default: 86400, one day)
    /// - `TTL_LONG_SECS` - Long TTL in seconds (default: 2592000, thirty days)
    /// - `SWEEP_INTERVAL_SECS` - Expiry sweep frequency in seconds (default: 600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env::var("MAX_CACHE_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            ttl_short: env_secs("TTL_SHORT_SECS").unwrap_or(defaults.ttl_short),
            ttl_default: env_secs("TTL_DEFAULT_SECS").unwrap_or(defaults.ttl_default),
            ttl_long: env_secs("TTL_LONG_SECS").unwrap_or(defaults.ttl_long),
            sweep_interval: env_secs("SWEEP_INTERVAL_SECS").unwrap_or(defaults.sweep_interval),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl_short: Duration::from_secs(60 * 60),
            ttl_default: Duration::from_secs(24 * 60 * 60),
            ttl_long: Duration::from_secs(30 * 24 * 60 * 60),
            sweep_interval: Duration::from_secs(600),
        }
    }
}

/// Reads a duration in whole seconds from an environment variable.
fn env_secs(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.ttl_short, Duration::from_secs(3600));
        assert_eq!(config.ttl_default, Duration::from_secs(86_400));
        assert_eq!(config.ttl_long, Duration::from_secs(2_592_000));
        assert_eq!(config.sweep_interval, Duration::from_secs(600));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("MAX_CACHE_ENTRIES");
        env::remove_var("TTL_SHORT_SECS");
        env::remove_var("TTL_DEFAULT_SECS");
        env::remove_var("TTL_LONG_SECS");
        env::remove_var("SWEEP_INTERVAL_SECS");

        let config = CacheConfig::from_env();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.ttl_short, Duration::from_secs(3600));
        assert_eq!(config.ttl_long, Duration::from_secs(2_592_000));
    }

    #[test]
    fn test_ttl_classes_are_ordered() {
        let config = CacheConfig::default();
        assert!(config.ttl_short < config.ttl_default);
        assert!(config.ttl_default < config.ttl_long);
    }
}
