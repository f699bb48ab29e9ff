//! Cache status command.

use console::style;

use crate::cli::helpers::{open_dispatcher, print_json};
use crate::config::Settings;

/// Show per-batch cache status, optionally purging expired rows first.
pub async fn cmd_status(settings: &Settings, purge: bool, json: bool) -> anyhow::Result<()> {
    let dispatcher = open_dispatcher(settings).await?;
    let cache = dispatcher.cache();

    if purge {
        let removed = cache.purge_expired().await?;
        if !json {
            println!(
                "{} Purged {} expired rows",
                style("✓").green(),
                removed
            );
        }
    }

    let statuses = cache.status().await;
    if json {
        return print_json(&statuses);
    }

    println!(
        "{} Cache at {} (ttl {} days)",
        style("→").cyan(),
        settings.database_url(),
        cache.ttl().num_days()
    );
    for status in &statuses {
        if let Some(ref error) = status.error {
            println!(
                "  {} batch {}: {}",
                style("✗").red(),
                status.batch,
                error
            );
        } else if let (true, Some(expires_at)) = (status.cached, status.expires_at) {
            println!(
                "  {} batch {}: {} products, expires {}",
                style("✓").green(),
                status.batch,
                status.total_products,
                expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        } else {
            println!(
                "  {} batch {}: not cached",
                style("-").dim(),
                status.batch
            );
        }
    }

    Ok(())
}
