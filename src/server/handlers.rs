//! HTTP request handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::AppState;
use crate::services::{HardFailure, ScrapeRequest};

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// CORS preflight. The CORS layer adds the headers.
pub async fn preflight() -> impl IntoResponse {
    StatusCode::OK
}

/// Run a scrape request. The body is optional and parsed leniently.
pub async fn scrape(State(state): State<AppState>, body: Bytes) -> Response {
    let request = ScrapeRequest::from_body(&body);

    match state.dispatcher.handle(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!("Scrape request failed: {}", e);
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(HardFailure::new(e.to_string()))).into_response()
        }
    }
}

/// Per-batch cache status.
pub async fn cache_status(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.dispatcher.cache();
    let batches = cache.status().await;

    Json(json!({
        "success": true,
        "ttlDays": cache.ttl().num_days(),
        "batches": batches,
    }))
}
