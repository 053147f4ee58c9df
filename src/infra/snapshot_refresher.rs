//! Background republishing of the `recent:articles` snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::articles::{assemble_views, publish_snapshot};
use crate::application::repos::{ArticleStore, CommentFetcher, RepoError};
use crate::cache::{CacheError, KeyValueCache};
use crate::config::{CacheSettings, RefresherSettings};

pub(crate) const METRIC_SNAPSHOT_REFRESH_SUCCESS: &str = "gazette_snapshot_refresh_success_total";
pub(crate) const METRIC_SNAPSHOT_REFRESH_FAILURE: &str = "gazette_snapshot_refresh_failure_total";
pub(crate) const METRIC_SNAPSHOT_REFRESH_MS: &str = "gazette_snapshot_refresh_ms";

const TARGET: &str = "gazette::snapshot_refresher";

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to load recent articles: {0}")]
    Store(#[from] RepoError),
    #[error("failed to publish snapshot: {0}")]
    Cache(#[from] CacheError),
    #[error("lookback of {0:?} reaches past the earliest representable date")]
    Lookback(Duration),
}

#[derive(Debug, Clone)]
pub struct RefresherConfig {
    pub interval: Duration,
    pub lookback: Duration,
    pub snapshot_ttl: Duration,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            lookback: Duration::from_secs(14 * 24 * 60 * 60),
            snapshot_ttl: Duration::from_secs(10 * 60),
        }
    }
}

impl RefresherConfig {
    pub fn from_settings(refresher: &RefresherSettings, cache: &CacheSettings) -> Self {
        Self {
            interval: refresher.interval,
            lookback: refresher.lookback,
            snapshot_ttl: cache.snapshot_ttl,
        }
    }
}

/// Rebuilds the article snapshot on a fixed interval until told to stop.
///
/// Each pass loads articles published within the lookback window, joins the
/// comment service's comments and overwrites `recent:articles`. A failed pass
/// is logged and the loop still waits the full interval before the next one;
/// the previous snapshot is left in place.
pub struct ArticleSnapshotRefresher {
    store: Arc<dyn ArticleStore>,
    fetcher: Arc<dyn CommentFetcher>,
    cache: Arc<dyn KeyValueCache>,
    config: RefresherConfig,
}

impl ArticleSnapshotRefresher {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        fetcher: Arc<dyn CommentFetcher>,
        cache: Arc<dyn KeyValueCache>,
        config: RefresherConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            cache,
            config,
        }
    }

    /// Run one rebuild. Returns the number of articles published.
    pub async fn refresh_once(&self) -> Result<usize, RefreshError> {
        let since = time::Duration::try_from(self.config.lookback)
            .ok()
            .and_then(|lookback| OffsetDateTime::now_utc().checked_sub(lookback))
            .ok_or(RefreshError::Lookback(self.config.lookback))?;
        let articles = self.store.list_recent_articles(since).await?;
        let views = assemble_views(articles, self.fetcher.as_ref()).await;
        publish_snapshot(self.cache.as_ref(), &views, self.config.snapshot_ttl).await?;
        Ok(views.len())
    }

    /// Loop until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            target = TARGET,
            interval_secs = self.config.interval.as_secs(),
            lookback_secs = self.config.lookback.as_secs(),
            "snapshot refresher started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let started = Instant::now();
            match self.refresh_once().await {
                Ok(count) => {
                    counter!(METRIC_SNAPSHOT_REFRESH_SUCCESS).increment(1);
                    info!(target = TARGET, articles = count, "article snapshot refreshed");
                }
                Err(err) => {
                    counter!(METRIC_SNAPSHOT_REFRESH_FAILURE).increment(1);
                    error!(target = TARGET, error = %err, "article snapshot refresh failed");
                }
            }
            histogram!(METRIC_SNAPSHOT_REFRESH_MS).record(started.elapsed().as_secs_f64() * 1000.0);

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(target = TARGET, "snapshot refresher stopped");
    }

    pub fn spawn(self) -> RefresherHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(receiver).await });
        RefresherHandle { shutdown, task }
    }
}

pub struct RefresherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Signal the loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        // The receiver is gone only if the task already ended.
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(target = TARGET, error = %err, "snapshot refresher task ended abnormally");
        }
    }
}
