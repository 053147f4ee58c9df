//! Article reads for the article service.
//!
//! `GET /articles` is served from the `recent:articles` snapshot when it is
//! cached. On a miss the latest articles are loaded, joined with comments
//! pulled from the comment service and written back with the snapshot TTL.
//! The background refresher writes the same key on its own schedule; the two
//! writers do not coordinate and the last write wins.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};

use crate::application::repos::{ArticleStore, CommentFetcher, RepoError};
use crate::cache::{CacheError, CacheOutcome, CacheResult, KeyValueCache, keys::RECENT_ARTICLES};
use crate::domain::articles::join_comments;
use crate::domain::entities::{ArticleRecord, ArticleView};

const TARGET: &str = "gazette::application::articles";

/// Articles returned by a request-time rebuild of the snapshot.
pub const RECENT_ARTICLES_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Cache health summary shown on the article service dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub ping: String,
    pub keys: u64,
    pub memory: Vec<String>,
    pub status: &'static str,
    pub time: String,
}

/// Join `articles` with whatever comments `fetcher` returns.
///
/// A failed fetch is logged and yields views with `comments: None`.
pub async fn assemble_views(
    articles: Vec<ArticleRecord>,
    fetcher: &dyn CommentFetcher,
) -> Vec<ArticleView> {
    let comments = match fetcher.fetch_all().await {
        Ok(comments) => Some(comments),
        Err(err) => {
            warn!(target = TARGET, error = %err, "comment fetch failed, serving articles without comments");
            None
        }
    };
    join_comments(articles, comments.as_deref())
}

/// Overwrite the snapshot key with `views`.
pub async fn publish_snapshot(
    cache: &dyn KeyValueCache,
    views: &[ArticleView],
    ttl: Duration,
) -> CacheResult<()> {
    let payload =
        serde_json::to_string(views).map_err(|err| CacheError::backend(err.to_string()))?;
    cache.set_with_ttl(RECENT_ARTICLES, &payload, ttl).await
}

pub struct ArticleFeedService {
    store: Arc<dyn ArticleStore>,
    fetcher: Arc<dyn CommentFetcher>,
    cache: Arc<dyn KeyValueCache>,
    snapshot_ttl: Duration,
}

impl ArticleFeedService {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        fetcher: Arc<dyn CommentFetcher>,
        cache: Arc<dyn KeyValueCache>,
        snapshot_ttl: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            cache,
            snapshot_ttl,
        }
    }

    pub async fn recent_articles(&self) -> Result<Vec<ArticleView>, FeedError> {
        self.lookup_recent_articles().await.map(|(views, _)| views)
    }

    /// Recent articles plus whether the snapshot cache answered.
    pub async fn lookup_recent_articles(
        &self,
    ) -> Result<(Vec<ArticleView>, CacheOutcome), FeedError> {
        if let Some(cached) = self.cached_snapshot().await {
            return Ok((cached, CacheOutcome::Hit));
        }

        info!(target = TARGET, "snapshot cache miss, loading articles from database");
        let articles = self
            .store
            .list_latest_articles(RECENT_ARTICLES_LIMIT)
            .await?;
        let views = assemble_views(articles, self.fetcher.as_ref()).await;

        if let Err(err) = publish_snapshot(self.cache.as_ref(), &views, self.snapshot_ttl).await {
            warn!(target = TARGET, error = %err, "failed to cache article snapshot");
        }

        Ok((views, CacheOutcome::Miss))
    }

    async fn cached_snapshot(&self) -> Option<Vec<ArticleView>> {
        let raw = match self.cache.get(RECENT_ARTICLES).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(target = TARGET, error = %err, "snapshot cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(views) => {
                info!(target = TARGET, "serving articles from snapshot cache");
                Some(views)
            }
            Err(err) => {
                warn!(target = TARGET, error = %err, "cached snapshot is undecodable, treating as miss");
                None
            }
        }
    }

    /// Cache latency, size and memory figures. Errors when the cache is down.
    pub async fn dashboard_stats(&self) -> CacheResult<DashboardStats> {
        let stats = self.cache.stats().await?;
        let now = OffsetDateTime::now_utc();
        let time = now
            .format(format_description!("[hour]:[minute]:[second] UTC"))
            .map_err(|err| CacheError::backend(err.to_string()))?;

        Ok(DashboardStats {
            ping: format!("{} ms", stats.round_trip.as_secs_f64() * 1000.0),
            keys: stats.keys,
            memory: stats.memory,
            status: "OK",
            time,
        })
    }
}
