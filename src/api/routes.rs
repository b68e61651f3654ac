//! Request handlers.

use crate::api::AppState;
use crate::feed::{BatchRequest, BatchResult};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// POST /api/parse - Fetch every URL in the request body
///
/// The body is decoded here rather than through the `Json` extractor so that
/// clients omitting `Content-Type` are still served.
pub async fn parse_feeds(State(state): State<AppState>, body: Bytes) -> Response {
    let request: BatchRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed parse request");
            return (StatusCode::BAD_REQUEST, Json(BatchResult::invalid_request())).into_response();
        }
    };

    tracing::info!(urls = request.urls.len(), "Parse request received");

    // Dropped connections drop this future; the child token covers server shutdown
    let cancel = state.shutdown.child_token();
    let result = state.fetcher.fetch_all(&request.urls, &cancel).await;

    (StatusCode::OK, Json(result)).into_response()
}

/// OPTIONS /api/parse - Preflight without CORS request headers
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// GET /health - Health check
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
