//! Cache-aside storage for per-article comment lists.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::entities::CommentRecord;

use super::config::CacheConfig;
use super::keys::comments_key;
use super::recency::RecencyIndex;
use super::store::KeyValueCache;

pub(crate) const METRIC_COMMENT_CACHE_HIT: &str = "gazette_comment_cache_hit_total";
pub(crate) const METRIC_COMMENT_CACHE_MISS: &str = "gazette_comment_cache_miss_total";

const TARGET: &str = "gazette::cache::comments";

/// Reads and writes cached comment lists and keeps the recency index current.
///
/// Store failures never escape: a failed read is a miss and a failed write
/// is logged and dropped.
pub struct CommentCacheManager {
    cache: Arc<dyn KeyValueCache>,
    recency: RecencyIndex,
    ttl: Duration,
}

impl CommentCacheManager {
    pub fn new(cache: Arc<dyn KeyValueCache>, config: &CacheConfig) -> Self {
        let recency = RecencyIndex::new(cache.clone(), config.recency_capacity);
        Self {
            cache,
            recency,
            ttl: config.comment_ttl,
        }
    }

    pub fn recency(&self) -> &RecencyIndex {
        &self.recency
    }

    /// Cached comments for `article_id`, newest first.
    ///
    /// A hit also refreshes the list's recency score. An undecodable value
    /// counts as a miss so the caller repopulates it from the store.
    pub async fn get_comments(&self, article_id: i32) -> Option<Vec<CommentRecord>> {
        let key = comments_key(article_id);

        let raw = match self.cache.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_COMMENT_CACHE_MISS, "reason" => "absent").increment(1);
                return None;
            }
            Err(err) => {
                warn!(target = TARGET, key = %key, error = %err, "comment cache read failed, treating as miss");
                counter!(METRIC_COMMENT_CACHE_MISS, "reason" => "unavailable").increment(1);
                return None;
            }
        };

        let comments: Vec<CommentRecord> = match serde_json::from_str(&raw) {
            Ok(comments) => comments,
            Err(err) => {
                warn!(target = TARGET, key = %key, error = %err, "cached comment list is undecodable, treating as miss");
                counter!(METRIC_COMMENT_CACHE_MISS, "reason" => "undecodable").increment(1);
                return None;
            }
        };

        if let Err(err) = self.recency.touch(&key).await {
            warn!(target = TARGET, key = %key, error = %err, "failed to touch recency index on hit");
        }

        counter!(METRIC_COMMENT_CACHE_HIT).increment(1);
        debug!(target = TARGET, article_id, count = comments.len(), "comment cache hit");
        Some(comments)
    }

    /// Write the full list for `article_id` and mark it recently used.
    ///
    /// If the touch fails after the write, the value stays cached outside the
    /// index until its expiry removes it.
    pub async fn set_comments(&self, article_id: i32, comments: &[CommentRecord]) {
        let key = comments_key(article_id);

        let payload = match serde_json::to_string(comments) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target = TARGET, key = %key, error = %err, "failed to serialize comment list");
                return;
            }
        };

        if let Err(err) = self.cache.set_with_ttl(&key, &payload, self.ttl).await {
            warn!(target = TARGET, key = %key, error = %err, "comment cache write failed");
            return;
        }

        if let Err(err) = self.recency.touch(&key).await {
            warn!(target = TARGET, key = %key, error = %err, "comment list cached but not indexed");
            return;
        }

        debug!(target = TARGET, article_id, count = comments.len(), "comment list cached");
    }
}
