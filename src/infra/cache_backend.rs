use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{KeyValueCache, MemoryCache, NoOpCache, RedisCache, redact_url};
use crate::config::{CacheBackend, CacheSettings};

const TARGET: &str = "gazette::infra::cache_backend";

/// Open the configured cache store.
///
/// Never fails: an unreachable Redis falls back to [`NoOpCache`], so the
/// service starts and serves straight from the database.
pub async fn connect(settings: &CacheSettings) -> Arc<dyn KeyValueCache> {
    let cache: Arc<dyn KeyValueCache> = match settings.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Redis => {
            match RedisCache::connect(&settings.redis_url, settings.command_timeout).await {
                Ok(redis) => Arc::new(redis),
                Err(err) => {
                    warn!(
                        target = TARGET,
                        url = %redact_url(&settings.redis_url),
                        error = %err,
                        "failed to connect to Redis, falling back to no-op cache"
                    );
                    Arc::new(NoOpCache)
                }
            }
        }
    };

    info!(
        target = TARGET,
        provider = cache.provider_name(),
        "cache backend ready"
    );
    cache
}
