use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::application::repos::{CommentFetcher, FetchError};
use crate::domain::entities::CommentRecord;

use super::error::InfraError;

/// Reads the comment service's `GET /comments` listing.
#[derive(Clone, Debug)]
pub struct HttpCommentFetcher {
    client: Client,
    url: String,
}

impl HttpCommentFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("gazette/", env!("CARGO_PKG_VERSION"))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CommentFetcher for HttpCommentFetcher {
    async fn fetch_all(&self) -> Result<Vec<CommentRecord>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<Vec<CommentRecord>>()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/comments")
    }

    fn fetcher(url: String) -> HttpCommentFetcher {
        HttpCommentFetcher::new(url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn decodes_comment_listing() {
        let body = r#"[{"id":7,"articleId":3,"author":"dee","text":"hi","createdAt":"2025-06-01T10:00:00Z"}]"#;
        let url = serve(Router::new().route(
            "/comments",
            get(move || async move { ([("content-type", "application/json")], body) }),
        ))
        .await;

        let comments = fetcher(url).fetch_all().await.unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].article_id, 3);
        assert_eq!(comments[0].text, "hi");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let url = serve(Router::new().route(
            "/comments",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;

        let result = fetcher(url).fetch_all().await;

        assert!(matches!(result, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let url = serve(Router::new().route("/comments", get(|| async { "not json" }))).await;

        let result = fetcher(url).fetch_all().await;

        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = fetcher(format!("http://{addr}/comments")).fetch_all().await;

        assert!(matches!(result, Err(FetchError::Request(_))));
    }
}
