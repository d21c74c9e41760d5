// HTTP route handlers for the Clash proxy
//
// The proxy speaks the sandbox's own dialect, so clients point their base URL
// at it instead of at the sandbox and never hold the API key.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use clash_common::types::Language;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::metrics;
use crate::AppState;

const SUBMISSIONS_ROUTE: &str = "/submissions";
const SUBMISSION_ROUTE: &str = "/submissions/:token";

fn too_many_requests() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "status": { "id": 429, "description": "Too Many Requests" }
        })),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}

/// Send a prepared upstream request and translate the answer
async fn forward(state: &AppState, route: &str, request: reqwest::RequestBuilder) -> Response {
    let upstream = &state.config.upstream;
    let request = request
        .header("X-RapidAPI-Key", &state.config.api_key)
        .header("X-RapidAPI-Host", &upstream.api_host);

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            error!(route, error = %e, "Upstream sandbox unreachable");
            metrics::record(route, StatusCode::BAD_GATEWAY.as_u16());
            return error_response(StatusCode::BAD_GATEWAY, format!("sandbox unreachable: {}", e));
        }
    };

    let status = response.status().as_u16();
    metrics::record(route, status);

    if status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
        warn!(route, "Upstream sandbox is rate limiting");
        return too_many_requests();
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            error!(route, error = %e, "Upstream response body lost");
            return error_response(StatusCode::BAD_GATEWAY, format!("sandbox response unreadable: {}", e));
        }
    };

    info!(route, status, bytes = body.len(), "Forwarded sandbox response");
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// POST /submissions - Create a submission upstream
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            metrics::record(SUBMISSIONS_ROUTE, StatusCode::BAD_REQUEST.as_u16());
            return error_response(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e));
        }
    };

    let language_id = payload.get("language_id").and_then(Value::as_u64);
    let language = language_id
        .and_then(|id| u32::try_from(id).ok())
        .and_then(Language::from_sandbox_id);
    let Some(language) = language else {
        warn!(language_id = ?payload.get("language_id"), "Rejected unsupported language");
        metrics::record(SUBMISSIONS_ROUTE, StatusCode::BAD_REQUEST.as_u16());
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unsupported language_id: {}", payload.get("language_id").unwrap_or(&Value::Null)),
        );
    };

    info!(language = %language, "Forwarding submission");

    let url = with_query(
        &format!("{}/submissions", state.config.upstream.base_url),
        query.as_deref(),
    );
    let request = state.http.post(url).json(&payload);
    forward(&state, SUBMISSIONS_ROUTE, request).await
}

/// GET /submissions/{token} - Fetch a submission's state upstream
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        metrics::record(SUBMISSION_ROUTE, StatusCode::BAD_REQUEST.as_u16());
        return error_response(StatusCode::BAD_REQUEST, "Invalid submission token");
    }

    let url = with_query(
        &format!("{}/submissions/{}", state.config.upstream.base_url, token),
        query.as_deref(),
    );
    forward(&state, SUBMISSION_ROUTE, state.http.get(url)).await
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    metrics::record("/status", 200);
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn export_metrics() -> Response {
    match metrics::render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
