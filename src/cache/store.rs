//! Key-value store contract the cache layer is written against.
//!
//! Every operation is a single store command and is atomic on its own.
//! Sequences of commands (see [`RecencyIndex`](super::RecencyIndex)) are not.

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheResult;

/// Point-in-time health figures for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub round_trip: Duration,
    pub keys: u64,
    /// `name:value` lines describing memory use, backend specific.
    pub memory: Vec<String>,
}

/// Whether a read-through lookup was answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        }
    }
}

#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Returns `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value and expiry.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Insert `member` or overwrite its score.
    async fn sorted_set_upsert(&self, index: &str, member: &str, score: i64) -> CacheResult<()>;

    async fn sorted_set_len(&self, index: &str) -> CacheResult<u64>;

    /// Lowest-scored member; ties resolve to the lexicographically smallest.
    async fn sorted_set_oldest(&self, index: &str) -> CacheResult<Option<String>>;

    async fn sorted_set_remove(&self, index: &str, member: &str) -> CacheResult<()>;

    async fn stats(&self) -> CacheResult<CacheStats>;

    fn provider_name(&self) -> &'static str;
}
