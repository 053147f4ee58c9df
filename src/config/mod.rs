//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides};

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "gazette";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_CACHE_COMMAND_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_COMMENT_TTL_SECS: u64 = 6 * 60 * 60;
const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 10 * 60;
const DEFAULT_RECENCY_CAPACITY: u64 = 30;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5 * 60;
const DEFAULT_REFRESH_LOOKBACK_DAYS: u64 = 14;
const MAX_REFRESH_LOOKBACK_DAYS: u64 = 3_650;
const DEFAULT_COMMENT_SERVICE_URL: &str = "http://comment-service:8080/comments";
const DEFAULT_COMMENT_SERVICE_TIMEOUT_MS: u64 = 5_000;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub refresher: RefresherSettings,
    pub comment_service: CommentServiceSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown backend `{other}` (expected redis|memory)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub command_timeout: Duration,
    pub comment_ttl: Duration,
    pub snapshot_ttl: Duration,
    pub recency_capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct RefresherSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub lookback: Duration,
}

#[derive(Debug, Clone)]
pub struct CommentServiceSettings {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("GAZETTE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_serve_overrides(cli.command.overrides());

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    refresher: RawRefresherSettings,
    comment_service: RawCommentServiceSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.cache_redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }
        if let Some(millis) = overrides.cache_command_timeout_ms {
            self.cache.command_timeout_ms = Some(millis);
        }
        if let Some(seconds) = overrides.cache_comment_ttl_seconds {
            self.cache.comment_ttl_seconds = Some(seconds);
        }
        if let Some(capacity) = overrides.cache_recency_capacity {
            self.cache.recency_capacity = Some(capacity);
        }
        if let Some(seconds) = overrides.cache_snapshot_ttl_seconds {
            self.cache.snapshot_ttl_seconds = Some(seconds);
        }
        if let Some(enabled) = overrides.refresher_enabled {
            self.refresher.enabled = Some(enabled);
        }
        if let Some(seconds) = overrides.refresher_interval_seconds {
            self.refresher.interval_seconds = Some(seconds);
        }
        if let Some(days) = overrides.refresher_lookback_days {
            self.refresher.lookback_days = Some(days);
        }
        if let Some(url) = overrides.comment_service_url.as_ref() {
            self.comment_service.url = Some(url.clone());
        }
        if let Some(millis) = overrides.comment_service_timeout_ms {
            self.comment_service.timeout_ms = Some(millis);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            refresher,
            comment_service,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            refresher: build_refresher_settings(refresher)?,
            comment_service: build_comment_service_settings(comment_service)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = positive_duration(
        graceful_secs,
        Duration::from_secs,
        "server.graceful_shutdown_seconds",
    )?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(max_value).ok_or_else(|| {
        LoadError::invalid("database.max_connections", "must be greater than zero")
    })?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match cache.backend {
        Some(value) => CacheBackend::from_str(&value)
            .map_err(|reason| LoadError::invalid("cache.backend", reason))?,
        None => CacheBackend::Redis,
    };

    let redis_url = non_blank(cache.redis_url).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
    if !redis_url.starts_with("redis://") && !redis_url.starts_with("rediss://") {
        return Err(LoadError::invalid(
            "cache.redis_url",
            "expected a redis:// or rediss:// URL",
        ));
    }

    let command_timeout = positive_duration(
        cache
            .command_timeout_ms
            .unwrap_or(DEFAULT_CACHE_COMMAND_TIMEOUT_MS),
        Duration::from_millis,
        "cache.command_timeout_ms",
    )?;
    let comment_ttl = positive_duration(
        cache.comment_ttl_seconds.unwrap_or(DEFAULT_COMMENT_TTL_SECS),
        Duration::from_secs,
        "cache.comment_ttl_seconds",
    )?;
    let snapshot_ttl = positive_duration(
        cache
            .snapshot_ttl_seconds
            .unwrap_or(DEFAULT_SNAPSHOT_TTL_SECS),
        Duration::from_secs,
        "cache.snapshot_ttl_seconds",
    )?;

    let capacity_value = cache.recency_capacity.unwrap_or(DEFAULT_RECENCY_CAPACITY);
    let capacity = usize::try_from(capacity_value).map_err(|_| {
        LoadError::invalid(
            "cache.recency_capacity",
            "value exceeds supported range for usize",
        )
    })?;
    let recency_capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
        LoadError::invalid("cache.recency_capacity", "must be greater than zero")
    })?;

    Ok(CacheSettings {
        backend,
        redis_url,
        command_timeout,
        comment_ttl,
        snapshot_ttl,
        recency_capacity,
    })
}

fn build_refresher_settings(
    refresher: RawRefresherSettings,
) -> Result<RefresherSettings, LoadError> {
    let interval = positive_duration(
        refresher
            .interval_seconds
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        Duration::from_secs,
        "refresher.interval_seconds",
    )?;

    let lookback_days = refresher
        .lookback_days
        .unwrap_or(DEFAULT_REFRESH_LOOKBACK_DAYS);
    if lookback_days > MAX_REFRESH_LOOKBACK_DAYS {
        return Err(LoadError::invalid(
            "refresher.lookback_days",
            format!("must be at most {MAX_REFRESH_LOOKBACK_DAYS}"),
        ));
    }
    let lookback = positive_duration(
        lookback_days * SECONDS_PER_DAY,
        Duration::from_secs,
        "refresher.lookback_days",
    )?;

    Ok(RefresherSettings {
        enabled: refresher.enabled.unwrap_or(true),
        interval,
        lookback,
    })
}

fn build_comment_service_settings(
    comment_service: RawCommentServiceSettings,
) -> Result<CommentServiceSettings, LoadError> {
    let url = non_blank(comment_service.url)
        .unwrap_or_else(|| DEFAULT_COMMENT_SERVICE_URL.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(LoadError::invalid(
            "comment_service.url",
            "expected an http:// or https:// URL",
        ));
    }

    let timeout = positive_duration(
        comment_service
            .timeout_ms
            .unwrap_or(DEFAULT_COMMENT_SERVICE_TIMEOUT_MS),
        Duration::from_millis,
        "comment_service.timeout_ms",
    )?;

    Ok(CommentServiceSettings { url, timeout })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    redis_url: Option<String>,
    command_timeout_ms: Option<u64>,
    comment_ttl_seconds: Option<u64>,
    recency_capacity: Option<u64>,
    snapshot_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRefresherSettings {
    enabled: Option<bool>,
    interval_seconds: Option<u64>,
    lookback_days: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCommentServiceSettings {
    url: Option<String>,
    timeout_ms: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn positive_duration(
    value: u64,
    unit: fn(u64) -> Duration,
    key: &'static str,
) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(unit(value))
}
