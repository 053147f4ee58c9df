use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_COMMENT_CACHE_EVICT, METRIC_COMMENT_CACHE_HIT, METRIC_COMMENT_CACHE_MISS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;
use super::snapshot_refresher::{
    METRIC_SNAPSHOT_REFRESH_FAILURE, METRIC_SNAPSHOT_REFRESH_MS, METRIC_SNAPSHOT_REFRESH_SUCCESS,
};

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_COMMENT_CACHE_HIT,
            Unit::Count,
            "Total number of comment lists served from the cache."
        );
        describe_counter!(
            METRIC_COMMENT_CACHE_MISS,
            Unit::Count,
            "Total number of comment cache misses, labelled by reason."
        );
        describe_counter!(
            METRIC_COMMENT_CACHE_EVICT,
            Unit::Count,
            "Total number of comment lists evicted by the recency bound."
        );
        describe_counter!(
            METRIC_SNAPSHOT_REFRESH_SUCCESS,
            Unit::Count,
            "Total number of article snapshot refreshes that published."
        );
        describe_counter!(
            METRIC_SNAPSHOT_REFRESH_FAILURE,
            Unit::Count,
            "Total number of article snapshot refreshes that failed."
        );
        describe_histogram!(
            METRIC_SNAPSHOT_REFRESH_MS,
            Unit::Milliseconds,
            "Article snapshot refresh latency in milliseconds."
        );
    });
}
