//! Store that never holds anything.
//!
//! Installed when Redis cannot be reached at startup so the services keep
//! answering from the database instead of refusing to start.

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheResult;
use super::store::{CacheStats, KeyValueCache};

#[derive(Debug, Clone, Default)]
pub struct NoOpCache;

#[async_trait]
impl KeyValueCache for NoOpCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn sorted_set_upsert(&self, _index: &str, _member: &str, _score: i64) -> CacheResult<()> {
        Ok(())
    }

    async fn sorted_set_len(&self, _index: &str) -> CacheResult<u64> {
        Ok(0)
    }

    async fn sorted_set_oldest(&self, _index: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn sorted_set_remove(&self, _index: &str, _member: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        Ok(CacheStats {
            round_trip: Duration::ZERO,
            keys: 0,
            memory: Vec::new(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}
