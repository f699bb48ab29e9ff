//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod cache;
mod init;
mod scrape;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "tool-scout")]
#[command(about = "Batched tool-catalogue scraping with a weekly cache")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing tool-scout.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the HTTP server
    Serve {
        /// Address to bind: port, host, or host:port
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },

    /// Scrape one batch (served from cache unless --force)
    Scrape {
        /// Batch number
        #[arg(short, long, default_value = "1")]
        batch: i64,
        /// Ignore the cache and scrape again
        #[arg(short, long)]
        force: bool,
        /// Output the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print every cached batch merged together
    Merge {
        /// Output the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-batch cache status
    Status {
        /// Delete expired cache rows first
        #[arg(long)]
        purge: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        target: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Scrape { batch, force, json } => {
            scrape::cmd_scrape(&settings, batch, force, json).await
        }
        Commands::Merge { json } => scrape::cmd_merge(&settings, json).await,
        Commands::Status { purge, json } => cache::cmd_status(&settings, purge, json).await,
    }
}
