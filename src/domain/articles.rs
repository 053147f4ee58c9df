//! Joining articles with comment data fetched from elsewhere.

use std::collections::HashMap;

use crate::domain::entities::{ArticleComment, ArticleRecord, ArticleView, CommentRecord};

/// Attach comments to their articles, preserving the order of both inputs.
///
/// Passing `None` for `comments` skips cross-referencing entirely and every
/// view carries `comments: None`.
pub fn join_comments(
    articles: Vec<ArticleRecord>,
    comments: Option<&[CommentRecord]>,
) -> Vec<ArticleView> {
    let grouped = comments.map(|comments| {
        let mut by_article: HashMap<i32, Vec<ArticleComment>> = HashMap::new();
        for comment in comments {
            by_article
                .entry(comment.article_id)
                .or_default()
                .push(ArticleComment::from(comment));
        }
        by_article
    });

    articles
        .into_iter()
        .map(|article| {
            let comments = grouped
                .as_ref()
                .map(|by_article| by_article.get(&article.id).cloned().unwrap_or_default());
            ArticleView {
                id: article.id,
                title: article.title,
                body: article.body,
                published_at: article.published_at,
                comments,
            }
        })
        .collect()
}
