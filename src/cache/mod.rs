//! Gazette cache layer.
//!
//! Comment lists and the recent-articles snapshot live in a shared key-value
//! store (Redis in production). The database stays the source of truth; the
//! cache is filled on demand and bounded two ways:
//!
//! - **Expiry**: every value is written with a TTL (comments 6 h, snapshot
//!   10 min).
//! - **Recency**: comment lists are tracked in the `comment:lru` sorted set
//!   and the least recently touched list is evicted once the set holds more
//!   than `recency_capacity` keys.
//!
//! ## Key namespace
//!
//! ```text
//! comments:{articleId}   JSON array of comments, newest first
//! comment:lru            sorted set of the keys above, scored by unix second
//! recent:articles        JSON array of articles with their comments
//! ```

mod comments;
mod config;
mod error;
pub mod keys;
mod memory;
mod noop;
mod recency;
mod redis;
mod store;

pub use comments::CommentCacheManager;
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use memory::MemoryCache;
pub use noop::NoOpCache;
pub use recency::RecencyIndex;
pub use self::redis::RedisCache;
pub use store::{CacheOutcome, CacheStats, KeyValueCache};

pub(crate) use comments::{METRIC_COMMENT_CACHE_HIT, METRIC_COMMENT_CACHE_MISS};
pub(crate) use recency::METRIC_COMMENT_CACHE_EVICT;
pub(crate) use self::redis::redact_url;
