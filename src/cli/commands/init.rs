//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;

    let registry = settings.registry()?;
    println!(
        "  {} {} batches configured ({} categories)",
        style("✓").green(),
        registry.len(),
        registry
            .batches()
            .iter()
            .map(|b| b.categories.len())
            .sum::<usize>()
    );

    if !settings.provider.has_api_key() {
        println!(
            "{} FIRECRAWL_API_KEY is not set; scrapes will fail until it is",
            style("!").yellow()
        );
    }

    println!(
        "{} Initialized tool-scout in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
