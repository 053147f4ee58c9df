//! Cache tuning: expiries and the recency bound.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_COMMENT_TTL_SECS: u64 = 6 * 60 * 60;
const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 10 * 60;
const DEFAULT_RECENCY_CAPACITY: NonZeroUsize = NonZeroUsize::new(30).unwrap();

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Expiry of a cached comment list, reset on every write.
    pub comment_ttl: Duration,
    /// Expiry of the `recent:articles` snapshot.
    pub snapshot_ttl: Duration,
    /// Maximum number of comment lists tracked by the recency index.
    pub recency_capacity: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            comment_ttl: Duration::from_secs(DEFAULT_COMMENT_TTL_SECS),
            snapshot_ttl: Duration::from_secs(DEFAULT_SNAPSHOT_TTL_SECS),
            recency_capacity: DEFAULT_RECENCY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            comment_ttl: settings.comment_ttl,
            snapshot_ttl: settings.snapshot_ttl,
            recency_capacity: settings.recency_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheBackend, CacheSettings};

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.comment_ttl, Duration::from_secs(21_600));
        assert_eq!(config.snapshot_ttl, Duration::from_secs(600));
        assert_eq!(config.recency_capacity.get(), 30);
    }

    #[test]
    fn settings_carry_over_unchanged() {
        let settings = CacheSettings {
            backend: CacheBackend::Memory,
            redis_url: "redis://unused".to_string(),
            command_timeout: Duration::from_millis(100),
            comment_ttl: Duration::from_secs(60),
            snapshot_ttl: Duration::from_secs(30),
            recency_capacity: NonZeroUsize::new(4).unwrap(),
        };

        let config = CacheConfig::from(&settings);

        assert_eq!(config.comment_ttl, Duration::from_secs(60));
        assert_eq!(config.snapshot_ttl, Duration::from_secs(30));
        assert_eq!(config.recency_capacity.get(), 4);
    }
}
