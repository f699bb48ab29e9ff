//! Data models for tool-scout.

mod batch;
mod product;

pub use batch::{BatchNumber, BatchRecord};
pub use product::{
    normalize_products, Product, RawProduct, DEFAULT_AVAILABILITY, DEFAULT_IMAGE, DEFAULT_PRICE,
};

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp for storage and responses.
///
/// Fixed-width UTC (`2024-01-01T00:00:00.000000Z`) so that string ordering in
/// the database matches chronological ordering.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, defaulting to Unix epoch on error.
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
