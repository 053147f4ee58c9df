use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::cache::CacheOutcome;

const TARGET: &str = "gazette::http::response";

/// Tells clients whether the body came from the cache.
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Mark a read-through response with its cache outcome for the log line and
/// the `x-cache` header.
pub fn with_cache_outcome(mut response: Response, outcome: CacheOutcome) -> Response {
    response
        .headers_mut()
        .insert(X_CACHE.clone(), HeaderValue::from_static(outcome.as_str()));
    response.extensions_mut().insert(outcome);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    let cache = response
        .extensions()
        .get::<CacheOutcome>()
        .map(|outcome| outcome.as_str())
        .unwrap_or("none");

    if !status.is_client_error() && !status.is_server_error() {
        debug!(
            target = TARGET,
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            elapsed_ms = elapsed_ms,
            cache = cache,
            request_id = request_id,
            "request served",
        );
        return response;
    }

    let report = response.extensions_mut().remove::<ErrorReport>();
    let (source, messages) = match report {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());

    if status.is_server_error() {
        error!(
            target = TARGET,
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            elapsed_ms = elapsed_ms,
            source = source,
            detail = %detail,
            chain = ?messages,
            request_id = request_id,
            "request failed",
        );
    } else {
        warn!(
            target = TARGET,
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            elapsed_ms = elapsed_ms,
            source = source,
            detail = %detail,
            request_id = request_id,
            "client request error",
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{Json, http::StatusCode, response::IntoResponse};

    use super::*;

    #[test]
    fn outcome_is_exposed_as_header_and_extension() {
        let response =
            with_cache_outcome(Json(Vec::<u8>::new()).into_response(), CacheOutcome::Hit);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[&X_CACHE], "hit");
        assert_eq!(
            response.extensions().get::<CacheOutcome>(),
            Some(&CacheOutcome::Hit)
        );
    }
}
