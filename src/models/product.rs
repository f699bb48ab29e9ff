//! Product records and normalization of raw extraction output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::format_timestamp;
use crate::supplier::resolve_supplier;

pub const DEFAULT_AVAILABILITY: &str = "Check Availability";
pub const DEFAULT_IMAGE: &str = "/placeholder.svg";
pub const DEFAULT_PRICE: &str = "Price on request";

/// A normalized catalogue item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    /// Display price as supplied, currency prefix included.
    pub price: String,
    pub availability: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(default)]
    pub description: String,
    pub supplier: String,
    pub category: String,
    pub last_updated: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: Map<String, Value>,
}

/// An item as returned by the extraction provider.
///
/// Every field is optional and loosely typed; providers return numbers for
/// prices or strings for feature lists often enough that strict typing would
/// throw away usable rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub availability: Option<Value>,
    #[serde(default)]
    pub image: Option<Value>,
    #[serde(default, alias = "url", alias = "product_url")]
    pub product_url: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    /// Read but never trusted; the supplier comes from the source URL.
    #[serde(default)]
    pub supplier: Option<Value>,
    #[serde(default)]
    pub features: Option<Value>,
    #[serde(default)]
    pub specifications: Option<Value>,
}

impl RawProduct {
    /// Normalize into a [`Product`].
    ///
    /// Returns `None` when the item has no usable name.
    pub fn normalize(
        self,
        category: &str,
        source_url: &str,
        now: &DateTime<Utc>,
    ) -> Option<Product> {
        let name = text(self.name)?;

        Some(Product {
            name,
            price: text(self.price).unwrap_or_else(|| DEFAULT_PRICE.to_string()),
            availability: text(self.availability)
                .unwrap_or_else(|| DEFAULT_AVAILABILITY.to_string()),
            image: text(self.image).unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            product_url: text(self.product_url),
            description: text(self.description).unwrap_or_default(),
            supplier: resolve_supplier(source_url).to_string(),
            category: category.to_string(),
            last_updated: format_timestamp(now),
            features: features(self.features),
            specifications: match self.specifications {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            },
        })
    }
}

/// Pull the product list out of an extraction payload.
///
/// Accepts `{"products": [...]}` or a bare array. Anything else, and any item
/// that is not an object, is skipped.
pub fn normalize_products(
    payload: &Value,
    category: &str,
    source_url: &str,
    now: &DateTime<Utc>,
) -> Vec<Product> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("products") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value::<RawProduct>(item.clone()).ok())
        .filter_map(|raw| raw.normalize(category, source_url, now))
        .collect()
}

/// Non-empty trimmed text from a loosely typed value.
fn text(value: Option<Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn features(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(|v| text(Some(v))).collect(),
        Some(other) => text(Some(other)).into_iter().collect(),
        None => Vec::new(),
    }
}
