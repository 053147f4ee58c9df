//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: i32,
    pub title: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

/// A comment as cached and served. Lists of these are kept newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: i32,
    pub article_id: i32,
    pub author: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Comment as stored in the `comments` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub id: i32,
    pub article_id: i32,
    pub author: String,
    pub content: String,
    pub created_utc: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            article_id: row.article_id,
            author: row.author,
            text: row.content,
            created_at: row.created_utc,
        }
    }
}

/// Comment as embedded inside an [`ArticleView`]; the article id is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleComment {
    pub id: i32,
    pub author: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&CommentRecord> for ArticleComment {
    fn from(comment: &CommentRecord) -> Self {
        Self {
            id: comment.id,
            author: comment.author.clone(),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }
}

/// Article joined with its comments.
///
/// `comments` is `None` when comment data could not be fetched, which is
/// distinct from an article that simply has no comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub id: i32,
    pub title: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub comments: Option<Vec<ArticleComment>>,
}
