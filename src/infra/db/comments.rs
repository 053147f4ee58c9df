use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CommentStore, RepoError},
    domain::entities::CommentRow,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentTableRow {
    id: i32,
    articleid: i32,
    author: String,
    content: String,
    createdutc: OffsetDateTime,
}

impl From<CommentTableRow> for CommentRow {
    fn from(row: CommentTableRow) -> Self {
        Self {
            id: row.id,
            article_id: row.articleid,
            author: row.author,
            content: row.content,
            created_utc: row.createdutc,
        }
    }
}

#[async_trait]
impl CommentStore for PostgresRepositories {
    async fn list_comments_for_article(
        &self,
        article_id: i32,
    ) -> Result<Vec<CommentRow>, RepoError> {
        let rows = sqlx::query_as::<_, CommentTableRow>(
            r#"
            SELECT id, articleid, author, content, createdutc
            FROM comments
            WHERE articleid = $1
            ORDER BY createdutc DESC
            "#,
        )
        .bind(article_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRow::from).collect())
    }

    async fn list_latest_comments(&self, limit: u32) -> Result<Vec<CommentRow>, RepoError> {
        let rows = sqlx::query_as::<_, CommentTableRow>(
            r#"
            SELECT id, articleid, author, content, createdutc
            FROM comments
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRow::from).collect())
    }
}
