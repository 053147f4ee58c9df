//! Comment reads for the comment service: read-through over the comment cache.

use std::sync::Arc;

use tracing::info;

use crate::application::repos::{CommentStore, RepoError};
use crate::cache::{CacheOutcome, CommentCacheManager};
use crate::domain::entities::CommentRecord;

const LATEST_COMMENTS_LIMIT: u32 = 30;

pub struct CommentService {
    store: Arc<dyn CommentStore>,
    cache: Arc<CommentCacheManager>,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>, cache: Arc<CommentCacheManager>) -> Self {
        Self { store, cache }
    }

    /// Comments on `article_id`, newest first.
    ///
    /// Served from the cache when present; otherwise loaded from the store and
    /// written through. A store failure is returned as is, nothing partial is
    /// cached.
    pub async fn comments_for_article(
        &self,
        article_id: i32,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        self.lookup_comments(article_id)
            .await
            .map(|(comments, _)| comments)
    }

    /// Same as [`comments_for_article`](Self::comments_for_article), also
    /// reporting whether the cache answered.
    pub async fn lookup_comments(
        &self,
        article_id: i32,
    ) -> Result<(Vec<CommentRecord>, CacheOutcome), RepoError> {
        if let Some(cached) = self.cache.get_comments(article_id).await {
            return Ok((cached, CacheOutcome::Hit));
        }

        info!(
            target = "gazette::application::comments",
            article_id, "comment cache miss, loading from database"
        );

        let comments: Vec<CommentRecord> = self
            .store
            .list_comments_for_article(article_id)
            .await?
            .into_iter()
            .map(CommentRecord::from)
            .collect();

        self.cache.set_comments(article_id, &comments).await;
        Ok((comments, CacheOutcome::Miss))
    }

    /// Most recent comments across all articles, uncached.
    pub async fn latest_comments(&self) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = self
            .store
            .list_latest_comments(LATEST_COMMENTS_LIMIT)
            .await?;
        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }
}
