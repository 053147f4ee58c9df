use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use time::{OffsetDateTime, macros::datetime};
use tower::ServiceExt;

use gazette::application::articles::ArticleFeedService;
use gazette::application::repos::{
    ArticleStore, CommentFetcher, FetchError, HealthCheck, RepoError,
};
use gazette::cache::{KeyValueCache, MemoryCache, keys::RECENT_ARTICLES};
use gazette::domain::entities::{ArticleRecord, CommentRecord};
use gazette::infra::http::{ArticleState, build_article_router};

#[derive(Default)]
struct FakeArticleStore {
    calls: AtomicUsize,
    down: AtomicBool,
}

#[async_trait]
impl ArticleStore for FakeArticleStore {
    async fn list_recent_articles(
        &self,
        _since: OffsetDateTime,
    ) -> Result<Vec<ArticleRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn list_latest_articles(&self, limit: u32) -> Result<Vec<ArticleRecord>, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("pool timed out".into()));
        }
        assert_eq!(limit, 10);
        Ok(vec![
            ArticleRecord {
                id: 2,
                title: "Second".into(),
                body: "later".into(),
                published_at: datetime!(2025-05-02 09:00 UTC),
            },
            ArticleRecord {
                id: 1,
                title: "First".into(),
                body: "earlier".into(),
                published_at: datetime!(2025-05-01 09:00 UTC),
            },
        ])
    }
}

#[async_trait]
impl HealthCheck for FakeArticleStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeCommentService {
    offline: AtomicBool,
}

#[async_trait]
impl CommentFetcher for FakeCommentService {
    async fn fetch_all(&self) -> Result<Vec<CommentRecord>, FetchError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Status(502));
        }
        Ok(vec![CommentRecord {
            id: 10,
            article_id: 1,
            author: "reader".into(),
            text: "nice".into(),
            created_at: datetime!(2025-05-03 10:00 UTC),
        }])
    }
}

struct Harness {
    router: Router,
    store: Arc<FakeArticleStore>,
    comments: Arc<FakeCommentService>,
    cache: Arc<MemoryCache>,
}

fn harness() -> Harness {
    let store = Arc::new(FakeArticleStore::default());
    let comments = Arc::new(FakeCommentService::default());
    let cache = Arc::new(MemoryCache::new());
    let feed = Arc::new(ArticleFeedService::new(
        store.clone(),
        comments.clone(),
        cache.clone(),
        Duration::from_secs(600),
    ));
    let router = build_article_router(ArticleState {
        feed,
        db: store.clone(),
    });
    Harness {
        router,
        store,
        comments,
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
async fn articles_are_joined_with_comments_and_snapshotted() {
    let harness = harness();

    let (status, body) = get(&harness.router, "/articles").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let articles = json.as_array().unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0]["id"], 2);
    assert_eq!(articles[0]["comments"], Value::Array(Vec::new()));
    assert_eq!(articles[1]["comments"][0]["text"], "nice");
    assert_eq!(articles[1]["publishedAt"], "2025-05-01T09:00:00Z");

    let snapshot = harness.cache.get(RECENT_ARTICLES).await.unwrap();
    assert!(snapshot.is_some());
}

#[tokio::test]
async fn snapshot_hit_skips_the_database() {
    let harness = harness();

    let (_, first) = get(&harness.router, "/articles").await;
    harness.store.down.store(true, Ordering::SeqCst);
    let (status, second) = get(&harness.router, "/articles").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(harness.store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn comment_service_outage_yields_null_comments() {
    let harness = harness();
    harness.comments.offline.store(true, Ordering::SeqCst);

    let (status, body) = get(&harness.router, "/articles").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    for article in json.as_array().unwrap() {
        assert!(article["comments"].is_null());
    }
}

#[tokio::test]
async fn database_outage_on_miss_is_a_503() {
    let harness = harness();
    harness.store.down.store(true, Ordering::SeqCst);

    let (status, body) = get(&harness.router, "/articles").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, b"Service temporarily unavailable");
}

#[tokio::test]
async fn dashboard_reports_cache_figures() {
    let harness = harness();
    get(&harness.router, "/articles").await;

    let (status, body) = get(&harness.router, "/dashboard/stats").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "OK");
    assert_eq!(json["keys"], 1);
    assert!(json["ping"].as_str().unwrap().ends_with(" ms"));
    assert!(json["time"].as_str().unwrap().ends_with(" UTC"));
}

#[tokio::test]
async fn dashboard_is_unavailable_without_cache() {
    let harness = harness();
    harness.cache.set_available(false);

    let (status, body) = get(&harness.router, "/dashboard/stats").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, b"Cache statistics unavailable");
}

#[tokio::test]
async fn health_is_no_content_when_database_answers() {
    let harness = harness();
    assert_eq!(get(&harness.router, "/health").await.0, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn article_lookups_report_cache_outcome() {
    let harness = harness();

    assert_eq!(x_cache(&harness.router, "/articles").await.as_deref(), Some("miss"));
    assert_eq!(x_cache(&harness.router, "/articles").await.as_deref(), Some("hit"));
    assert_eq!(x_cache(&harness.router, "/health").await, None);
}
