//! Shared helper functions for CLI commands.

use console::style;
use serde::Serialize;

use crate::config::Settings;
use crate::models::Product;
use crate::services::Dispatcher;

/// Open the cache database and build a dispatcher.
pub async fn open_dispatcher(settings: &Settings) -> anyhow::Result<Dispatcher> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;
    settings.create_dispatcher(&ctx)
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print one line per product, grouped under category headings.
pub fn print_products(products: &[Product]) {
    let mut current: Option<&str> = None;
    for product in products {
        if current != Some(product.category.as_str()) {
            println!("\n{}", style(&product.category).bold());
            current = Some(product.category.as_str());
        }
        println!(
            "  {} {} {}",
            style(&product.price).green(),
            product.name,
            style(format!("({})", product.supplier)).dim()
        );
    }
}

/// Truncate long text for terminal output.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long product name", 10), "a very ...");
        assert_eq!(truncate("£12.99 – £15.99", 20), "£12.99 – £15.99");
    }
}
