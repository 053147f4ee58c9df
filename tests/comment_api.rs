use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use time::macros::datetime;
use tower::ServiceExt;

use gazette::application::comments::CommentService;
use gazette::application::repos::{CommentStore, HealthCheck, RepoError};
use gazette::cache::{CacheConfig, CommentCacheManager, MemoryCache, keys::COMMENT_RECENCY_INDEX};
use gazette::domain::entities::CommentRow;
use gazette::infra::http::{CommentState, build_comment_router};

#[derive(Default)]
struct FakeCommentStore {
    per_article_calls: AtomicUsize,
    down: AtomicBool,
}

fn row(id: i32, article_id: i32) -> CommentRow {
    CommentRow {
        id,
        article_id,
        author: format!("author-{id}"),
        content: format!("comment {id}"),
        created_utc: datetime!(2025-06-01 12:00 UTC) + time::Duration::minutes(i64::from(id)),
    }
}

#[async_trait]
impl CommentStore for FakeCommentStore {
    async fn list_comments_for_article(
        &self,
        article_id: i32,
    ) -> Result<Vec<CommentRow>, RepoError> {
        self.per_article_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("connection refused".into()));
        }
        Ok(vec![row(article_id * 10 + 2, article_id), row(article_id * 10 + 1, article_id)])
    }

    async fn list_latest_comments(&self, limit: u32) -> Result<Vec<CommentRow>, RepoError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        let limit = i32::try_from(limit).unwrap();
        Ok((1..=limit + 5).rev().take(limit as usize).map(|id| row(id, 1)).collect())
    }
}

#[async_trait]
impl HealthCheck for FakeCommentStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        if self.down.load(Ordering::SeqCst) {
            Err(RepoError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    router: Router,
    store: Arc<FakeCommentStore>,
    cache: Arc<MemoryCache>,
}

fn harness() -> Harness {
    let store = Arc::new(FakeCommentStore::default());
    let cache = Arc::new(MemoryCache::new());
    let manager = Arc::new(CommentCacheManager::new(
        cache.clone(),
        &CacheConfig::default(),
    ));
    let service = Arc::new(CommentService::new(store.clone(), manager));
    let router = build_comment_router(CommentState {
        comments: service,
        db: store.clone(),
    });
    Harness {
        router,
        store,
        cache,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec();
    (status, body)
}

async fn x_cache(router: &Router, uri: &str) -> Option<String> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    response
        .headers()
        .get("x-cache")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn article_comments_are_read_through_and_indexed() {
    let harness = harness();

    let (status, first) = get(&harness.router, "/comments/42").await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = get(&harness.router, "/comments/42").await;

    assert_eq!(first, second);
    assert_eq!(harness.store.per_article_calls.load(Ordering::SeqCst), 1);

    let json: Value = serde_json::from_slice(&first).unwrap();
    let comments = json.as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["id"], 422);
    assert_eq!(comments[0]["articleId"], 42);
    assert_eq!(comments[0]["text"], "comment 422");
    assert!(comments[0]["createdAt"].as_str().unwrap().ends_with('Z'));

    assert_eq!(
        harness.cache.members(COMMENT_RECENCY_INDEX).await,
        vec!["comments:42"]
    );
}

#[tokio::test]
async fn latest_comments_lists_thirty_highest_ids() {
    let harness = harness();

    let (status, body) = get(&harness.router, "/comments").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 30);
    assert_eq!(ids.first(), Some(&35));
    assert!(ids.windows(2).all(|pair| pair[0] > pair[1]));
}

#[tokio::test]
async fn store_outage_on_miss_is_a_503_and_nothing_is_cached() {
    let harness = harness();
    harness.store.down.store(true, Ordering::SeqCst);

    let (status, body) = get(&harness.router, "/comments/7").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, b"Service temporarily unavailable");
    assert!(harness.cache.members(COMMENT_RECENCY_INDEX).await.is_empty());
}

#[tokio::test]
async fn cached_comments_survive_a_store_outage() {
    let harness = harness();
    let (status, warm) = get(&harness.router, "/comments/3").await;
    assert_eq!(status, StatusCode::OK);

    harness.store.down.store(true, Ordering::SeqCst);
    let (status, cached) = get(&harness.router, "/comments/3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(warm, cached);
}

#[tokio::test]
async fn cache_outage_serves_from_store() {
    let harness = harness();
    harness.cache.set_available(false);

    let (first, _) = get(&harness.router, "/comments/5").await;
    let (second, _) = get(&harness.router, "/comments/5").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(harness.store.per_article_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn non_numeric_article_id_is_rejected() {
    let harness = harness();

    let (status, _) = get(&harness.router, "/comments/not-a-number").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.store.per_article_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn health_reflects_database_reachability() {
    let harness = harness();
    assert_eq!(get(&harness.router, "/health").await.0, StatusCode::NO_CONTENT);

    harness.store.down.store(true, Ordering::SeqCst);
    assert_eq!(
        get(&harness.router, "/health").await.0,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn comment_lookups_report_cache_outcome() {
    let harness = harness();

    assert_eq!(x_cache(&harness.router, "/comments/11").await.as_deref(), Some("miss"));
    assert_eq!(x_cache(&harness.router, "/comments/11").await.as_deref(), Some("hit"));
    assert_eq!(x_cache(&harness.router, "/health").await, None);
}
