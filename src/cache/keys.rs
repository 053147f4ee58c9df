//! Cache key namespace shared with every process reading the same store.

/// Sorted set holding the recency score of every cached comment list.
pub const COMMENT_RECENCY_INDEX: &str = "comment:lru";

/// Serialized snapshot of recently published articles.
pub const RECENT_ARTICLES: &str = "recent:articles";

const COMMENTS_PREFIX: &str = "comments:";

/// Key of the cached comment list for one article.
pub fn comments_key(article_id: i32) -> String {
    format!("{COMMENTS_PREFIX}{article_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_keys_match_namespace() {
        assert_eq!(comments_key(42), "comments:42");
        assert_eq!(comments_key(-1), "comments:-1");
    }
}
