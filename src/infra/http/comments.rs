use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::{comments::CommentService, error::HttpError, repos::HealthCheck};

use super::db_health_response;
use super::middleware::{log_responses, set_request_context, with_cache_outcome};

#[derive(Clone)]
pub struct CommentState {
    pub comments: Arc<CommentService>,
    pub db: Arc<dyn HealthCheck>,
}

pub fn build_comment_router(state: CommentState) -> Router {
    Router::new()
        .route("/comments", get(latest_comments))
        .route("/comments/{article_id}", get(comments_for_article))
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn comments_for_article(
    State(state): State<CommentState>,
    Path(article_id): Path<i32>,
) -> Response {
    match state.comments.lookup_comments(article_id).await {
        Ok((comments, outcome)) => with_cache_outcome(Json(comments).into_response(), outcome),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn latest_comments(State(state): State<CommentState>) -> Response {
    match state.comments.latest_comments().await {
        Ok(comments) => Json(comments).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn health(State(state): State<CommentState>) -> Response {
    db_health_response(state.db.health_check().await)
}
