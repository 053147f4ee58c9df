//! Repository traits describing persistence and remote adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{ArticleRecord, CommentRecord, CommentRow};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Articles published at or after `since`, newest first.
    async fn list_recent_articles(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ArticleRecord>, RepoError>;

    /// The `limit` most recently published articles, newest first.
    async fn list_latest_articles(&self, limit: u32) -> Result<Vec<ArticleRecord>, RepoError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments on one article, newest first.
    async fn list_comments_for_article(&self, article_id: i32)
    -> Result<Vec<CommentRow>, RepoError>;

    /// The `limit` highest-id comments across all articles, highest id first.
    async fn list_latest_comments(&self, limit: u32) -> Result<Vec<CommentRow>, RepoError>;
}

/// Connectivity probe behind the `/health` routes.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("comment service request failed: {0}")]
    Request(String),
    #[error("comment service returned status {0}")]
    Status(u16),
    #[error("comment service returned an undecodable body: {0}")]
    Decode(String),
}

/// Pulls comment data owned by another service.
#[async_trait]
pub trait CommentFetcher: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<CommentRecord>, FetchError>;
}
