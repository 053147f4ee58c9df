use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Gazette binary.
#[derive(Debug, Parser)]
#[command(
    name = "gazette",
    version,
    about = "Article and comment services with a Redis cache-aside layer"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "GAZETTE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve recent articles and the cache dashboard; runs the snapshot refresher.
    Articles(Box<ServeArgs>),
    /// Serve comments with read-through caching.
    Comments(Box<ServeArgs>),
}

impl Command {
    pub fn overrides(&self) -> &ServeOverrides {
        match self {
            Command::Articles(args) | Command::Comments(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Select the cache backend (redis|memory).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub cache_backend: Option<String>,

    /// Override the Redis connection URL.
    #[arg(long = "cache-redis-url", value_name = "URL")]
    pub cache_redis_url: Option<String>,

    /// Override the per-command cache timeout.
    #[arg(long = "cache-command-timeout-ms", value_name = "MILLIS")]
    pub cache_command_timeout_ms: Option<u64>,

    /// Override the expiry of cached comment lists.
    #[arg(long = "cache-comment-ttl-seconds", value_name = "SECONDS")]
    pub cache_comment_ttl_seconds: Option<u64>,

    /// Override the number of comment lists kept by the recency index.
    #[arg(long = "cache-recency-capacity", value_name = "COUNT")]
    pub cache_recency_capacity: Option<u64>,

    /// Override the expiry of the recent-articles snapshot.
    #[arg(long = "cache-snapshot-ttl-seconds", value_name = "SECONDS")]
    pub cache_snapshot_ttl_seconds: Option<u64>,

    /// Toggle the background snapshot refresher.
    #[arg(
        long = "refresher-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub refresher_enabled: Option<bool>,

    /// Override the delay between snapshot refreshes.
    #[arg(long = "refresher-interval-seconds", value_name = "SECONDS")]
    pub refresher_interval_seconds: Option<u64>,

    /// Override how far back the snapshot reaches.
    #[arg(long = "refresher-lookback-days", value_name = "DAYS")]
    pub refresher_lookback_days: Option<u64>,

    /// Override the comment listing URL used to join comments into articles.
    #[arg(long = "comment-service-url", value_name = "URL")]
    pub comment_service_url: Option<String>,

    /// Override the comment service request timeout.
    #[arg(long = "comment-service-timeout-ms", value_name = "MILLIS")]
    pub comment_service_timeout_ms: Option<u64>,
}
