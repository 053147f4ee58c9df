//! Bounded recency index over cached comment lists.
//!
//! The index is a sorted set in the shared store (`comment:lru`) scored by the
//! unix second of the last touch. Touching runs upsert, length check and at
//! most one eviction as separate commands. The sequence is not atomic, so
//! concurrent touches can leave the set above capacity for a moment; the bound
//! holds eventually, with every later touch trimming one more entry.

use std::num::NonZeroUsize;
use std::sync::Arc;

use metrics::counter;
use time::OffsetDateTime;
use tracing::info;

use super::error::CacheResult;
use super::keys::COMMENT_RECENCY_INDEX;
use super::store::KeyValueCache;

pub(crate) const METRIC_COMMENT_CACHE_EVICT: &str = "gazette_comment_cache_evict_total";

pub struct RecencyIndex {
    cache: Arc<dyn KeyValueCache>,
    index_key: &'static str,
    capacity: NonZeroUsize,
}

impl RecencyIndex {
    pub fn new(cache: Arc<dyn KeyValueCache>, capacity: NonZeroUsize) -> Self {
        Self {
            cache,
            index_key: COMMENT_RECENCY_INDEX,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Record a touch of `cache_key` now. Returns the evicted key, if any.
    pub async fn touch(&self, cache_key: &str) -> CacheResult<Option<String>> {
        self.touch_at(cache_key, OffsetDateTime::now_utc().unix_timestamp())
            .await
    }

    /// Record a touch of `cache_key` with an explicit score.
    ///
    /// When the index outgrows its capacity the lowest-scored entry is
    /// dropped from the index and its cached value deleted. Never evicts more
    /// than one entry per call.
    pub async fn touch_at(&self, cache_key: &str, score: i64) -> CacheResult<Option<String>> {
        self.cache
            .sorted_set_upsert(self.index_key, cache_key, score)
            .await?;

        let len = self.cache.sorted_set_len(self.index_key).await?;
        if len <= self.capacity.get() as u64 {
            return Ok(None);
        }

        let Some(oldest) = self.cache.sorted_set_oldest(self.index_key).await? else {
            return Ok(None);
        };

        info!(
            target = "gazette::cache::recency",
            evicted = %oldest,
            len,
            capacity = self.capacity.get(),
            "evicting least recently touched comment list"
        );

        self.cache.delete(&oldest).await?;
        self.cache
            .sorted_set_remove(self.index_key, &oldest)
            .await?;
        counter!(METRIC_COMMENT_CACHE_EVICT).increment(1);

        Ok(Some(oldest))
    }
}
