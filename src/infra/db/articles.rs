use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ArticleStore, RepoError},
    domain::entities::ArticleRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i32,
    title: String,
    body: String,
    publishedutc: OffsetDateTime,
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            body: row.body,
            published_at: row.publishedutc,
        }
    }
}

#[async_trait]
impl ArticleStore for PostgresRepositories {
    async fn list_recent_articles(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ArticleRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, body, publishedutc
            FROM articles
            WHERE publishedutc >= $1
            ORDER BY publishedutc DESC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }

    async fn list_latest_articles(&self, limit: u32) -> Result<Vec<ArticleRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, body, publishedutc
            FROM articles
            ORDER BY publishedutc DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }
}
