use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

/// Map a request to the policy name guarding it.
///
/// Unmatched requests carry no endpoint name and bypass the engine
/// entirely; matched requests with no configured policy still fail open
/// inside the engine.
pub fn endpoint_name(method: &Method, path: &str) -> Option<&'static str> {
    match (method, path) {
        (&Method::POST, "/api/issues") => Some("postIssue"),
        (&Method::GET, "/api/issues") => Some("getIssues"),
        _ => None,
    }
}

/// Axum middleware gating guarded endpoints through the admission engine.
///
/// On rejection the request is short-circuited with a 429 carrying the
/// retry hint both as a JSON field and as a `Retry-After` header. On
/// admission the handler proceeds normally.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(endpoint) = endpoint_name(request.method(), request.uri().path()) else {
        return next.run(request).await;
    };

    let decision = state.engine.decide(endpoint, request.headers()).await;

    if !decision.admitted {
        return rejection_response(decision.retry_after_secs);
    }

    debug!(endpoint, "admission check passed");
    next.run(request).await
}

/// Build the 429 Too Many Requests response for a rejected request
pub fn rejection_response(retry_after_secs: Option<u64>) -> Response {
    let mut headers = HeaderMap::new();

    if let Some(retry) = retry_after_secs {
        if let Ok(value) = HeaderValue::from_str(&retry.to_string()) {
            headers.insert("Retry-After", value);
        }
    }

    let body = Json(serde_json::json!({
        "error": "Too many requests, please try again later",
        "retryAfter": retry_after_secs,
    }));

    (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
}
