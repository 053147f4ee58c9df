use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::{
    articles::ArticleFeedService,
    error::{ErrorReport, HttpError},
    repos::HealthCheck,
};

use super::db_health_response;
use super::middleware::{log_responses, set_request_context, with_cache_outcome};

#[derive(Clone)]
pub struct ArticleState {
    pub feed: Arc<ArticleFeedService>,
    pub db: Arc<dyn HealthCheck>,
}

pub fn build_article_router(state: ArticleState) -> Router {
    Router::new()
        .route("/articles", get(recent_articles))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn recent_articles(State(state): State<ArticleState>) -> Response {
    match state.feed.lookup_recent_articles().await {
        Ok((views, outcome)) => with_cache_outcome(Json(views).into_response(), outcome),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn dashboard_stats(State(state): State<ArticleState>) -> Response {
    match state.feed.dashboard_stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response = (status, "Cache statistics unavailable").into_response();
            ErrorReport::from_error("infra::http::dashboard_stats", status, &err)
                .attach(&mut response);
            response
        }
    }
}

async fn health(State(state): State<ArticleState>) -> Response {
    db_health_response(state.db.health_check().await)
}
