//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Path the scrape endpoint was originally deployed under.
const LEGACY_SCRAPE_PATH: &str = "/functions/v1/comprehensive-firecrawl-scraper";

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/tools/scrape",
            post(handlers::scrape).options(handlers::preflight),
        )
        .route(
            LEGACY_SCRAPE_PATH,
            post(handlers::scrape).options(handlers::preflight),
        )
        .route("/api/tools/status", get(handlers::cache_status))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
