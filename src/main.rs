//! tool-scout - batched tool-catalogue scraping with a weekly cache.
//!
//! Scrapes supplier search pages for electrical-trade tools through an
//! extraction provider, caches each batch for a week, and serves the
//! results over HTTP.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tool_scout::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "tool_scout=info"
    } else {
        "tool_scout=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
