//! HTTP server exposing the scrape dispatcher.
//!
//! Routes:
//! - `POST /api/tools/scrape` (also at the legacy function path)
//! - `GET /api/tools/status`
//! - `GET /health`

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::services::Dispatcher;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Build state from settings, creating the cache table if needed.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context()?;
        ctx.init_schema().await?;
        Ok(Self::new(settings.create_dispatcher(&ctx)?))
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings).await?;
    let app = create_router(state);

    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
