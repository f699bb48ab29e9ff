//! Web server command.

use std::net::SocketAddr;

use console::style;

use crate::config::Settings;

/// Default port when the bind address names only a host.
const DEFAULT_PORT: u16 = 3030;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let addr = parse_bind_address(bind)?;

    settings.ensure_directories()?;
    println!("{} Preparing cache database...", style("→").cyan());
    let ctx = settings.create_db_context()?;
    if let Err(e) = ctx.init_schema().await {
        eprintln!("  {} Schema setup failed: {}", style("✗").red(), e);
        return Err(anyhow::anyhow!("Database setup failed: {}", e));
    }
    println!("  {} Database ready", style("✓").green());

    if !settings.provider.has_api_key() {
        println!(
            "  {} FIRECRAWL_API_KEY is not set; only cached batches can be served",
            style("!").yellow()
        );
    }

    println!(
        "{} Starting tool-scout server at http://{}",
        style("→").cyan(),
        addr
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, addr).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<SocketAddr> {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(SocketAddr::from(([127, 0, 0, 1], port)));
    }

    if let Ok(addr) = bind.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Must be just a host, use default port
    format!("{}:{}", bind, DEFAULT_PORT)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind, e))
}
