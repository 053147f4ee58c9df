//! Redis-backed store.
//!
//! Uses `redis::aio::ConnectionManager`, which multiplexes one connection and
//! reconnects on its own. Each command is bounded by a client-side timeout so a
//! stalled server surfaces as [`CacheError::Timeout`] instead of hanging a
//! request.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::{Cmd, FromRedisValue, RedisError, aio::ConnectionManager};
use tracing::debug;

use super::error::{CacheError, CacheResult};
use super::store::{CacheStats, KeyValueCache};

const MEMORY_INFO_FIELDS: [&str; 2] = ["used_memory_human", "maxmemory_human"];

#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    command_timeout: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl RedisCache {
    pub async fn connect(url: &str, command_timeout: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|err| CacheError::unavailable(format!("invalid Redis URL: {err}")))?;

        let connection = tokio::time::timeout(command_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout { op: "connect" })?
            .map_err(|err| CacheError::unavailable(format!("failed to connect to Redis: {err}")))?;

        debug!(url = %redact_url(url), "Redis cache connected");

        Ok(Self {
            connection,
            command_timeout,
        })
    }

    async fn query<T: FromRedisValue>(&self, op: &'static str, cmd: Cmd) -> CacheResult<T> {
        let mut conn = self.connection.clone();
        match tokio::time::timeout(self.command_timeout, cmd.query_async::<T>(&mut conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(map_redis_error(op, err)),
            Err(_) => Err(CacheError::Timeout { op }),
        }
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let value: Option<String> = self.query("GET", cmd).await?;

        if value.is_some() {
            debug!(key, "Redis GET hit");
        } else {
            debug!(key, "Redis GET miss");
        }
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl_seconds = ttl.as_secs().max(1);
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_seconds);
        self.query::<()>("SET", cmd).await?;

        debug!(key, ttl_seconds, "Redis SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.query::<()>("DEL", cmd).await
    }

    async fn sorted_set_upsert(&self, index: &str, member: &str, score: i64) -> CacheResult<()> {
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(index).arg(score).arg(member);
        self.query::<()>("ZADD", cmd).await
    }

    async fn sorted_set_len(&self, index: &str) -> CacheResult<u64> {
        let mut cmd = redis::cmd("ZCARD");
        cmd.arg(index);
        self.query("ZCARD", cmd).await
    }

    async fn sorted_set_oldest(&self, index: &str) -> CacheResult<Option<String>> {
        let mut cmd = redis::cmd("ZRANGE");
        cmd.arg(index).arg(0).arg(0);
        let members: Vec<String> = self.query("ZRANGE", cmd).await?;
        Ok(members.into_iter().next())
    }

    async fn sorted_set_remove(&self, index: &str, member: &str) -> CacheResult<()> {
        let mut cmd = redis::cmd("ZREM");
        cmd.arg(index).arg(member);
        self.query::<()>("ZREM", cmd).await
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let started = Instant::now();
        let _: String = self.query("PING", redis::cmd("PING")).await?;
        let round_trip = started.elapsed();

        let keys: u64 = self.query("DBSIZE", redis::cmd("DBSIZE")).await?;

        let mut info = redis::cmd("INFO");
        info.arg("memory");
        let info: String = self.query("INFO", info).await?;

        Ok(CacheStats {
            round_trip,
            keys,
            memory: memory_lines(&info),
        })
    }

    fn provider_name(&self) -> &'static str {
        "redis"
    }
}

fn map_redis_error(op: &'static str, err: RedisError) -> CacheError {
    if err.is_timeout() {
        CacheError::Timeout { op }
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::unavailable(format!("Redis {op} failed: {err}"))
    } else {
        CacheError::backend(format!("Redis {op} failed: {err}"))
    }
}

/// Keep only the `INFO memory` lines shown on the dashboard.
fn memory_lines(info: &str) -> Vec<String> {
    info.lines()
        .map(str::trim_end)
        .filter(|line| {
            MEMORY_INFO_FIELDS
                .iter()
                .any(|field| line.starts_with(field))
        })
        .map(str::to_string)
        .collect()
}

/// Hide the password part of a Redis URL before logging it.
pub(crate) fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
