//! Scrape and merge commands.

use console::style;

use crate::cli::helpers::{open_dispatcher, print_json, print_products, truncate};
use crate::config::Settings;
use crate::services::{ScrapeRequest, ScrapeResponse};

/// Run one batch through the dispatcher.
pub async fn cmd_scrape(
    settings: &Settings,
    batch: i64,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let dispatcher = open_dispatcher(settings).await?;

    if !json {
        println!(
            "{} Batch {}{}",
            style("→").cyan(),
            batch,
            if force { " (forced refresh)" } else { "" }
        );
    }

    let response = dispatcher
        .handle(ScrapeRequest {
            force_refresh: force,
            ..ScrapeRequest::for_batch(batch)
        })
        .await?;

    if json {
        return print_json(&response);
    }

    print_response(&response);
    Ok(())
}

/// Print every cached batch merged together.
pub async fn cmd_merge(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let dispatcher = open_dispatcher(settings).await?;
    let response = dispatcher
        .handle(ScrapeRequest {
            merge_all: true,
            ..Default::default()
        })
        .await?;

    if json {
        return print_json(&response);
    }

    print_response(&response);
    Ok(())
}

fn print_response(response: &ScrapeResponse) {
    print_products(response.tools());
    println!();

    match response {
        ScrapeResponse::Fresh(fresh) => {
            for (category, count) in &fresh.category_stats {
                let marker = if *count > 0 {
                    style("✓").green()
                } else {
                    style("✗").red()
                };
                println!("  {} {}: {}", marker, truncate(category, 40), count);
            }
            println!(
                "{} {} ({:.1}s)",
                style("✓").green(),
                fresh.message,
                fresh.elapsed_time as f64 / 1000.0
            );
        }
        ScrapeResponse::Cached(cached) => {
            println!(
                "{} {} (expires {})",
                style("✓").green(),
                cached.message,
                cached.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        ScrapeResponse::Merge(merge) => {
            let marker = if merge.all_batches_complete {
                style("✓").green()
            } else {
                style("!").yellow()
            };
            println!("{} {}", marker, merge.message);
        }
        ScrapeResponse::SoftFailure(soft) => {
            println!("{} {}", style("✗").red(), soft.message);
        }
    }
}
