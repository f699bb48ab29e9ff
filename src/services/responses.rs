//! Request and response bodies of the scrape endpoint.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::Product;

/// Batch scraped when the request names none.
pub const DEFAULT_BATCH: i64 = 1;

/// `batch` field of a scrape request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchParam {
    Number(i64),
    /// Present but not an integer; kept as the raw JSON text.
    Malformed(String),
}

/// Body of a scrape request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub batch: Option<BatchParam>,
    pub force_refresh: bool,
    pub merge_all: bool,
}

impl ScrapeRequest {
    pub fn for_batch(batch: i64) -> Self {
        Self {
            batch: Some(BatchParam::Number(batch)),
            ..Default::default()
        }
    }

    /// Parse a request body field by field.
    ///
    /// A body that is empty, not JSON, or not an object yields the defaults.
    /// Otherwise each field falls back on its own: a flag of the wrong type
    /// reads as `false`, while a `batch` that is not an integer is kept as
    /// malformed so it can be rejected.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!("Ignoring unparseable scrape request body: {}", e);
                return Self::default();
            }
        };
        let Some(fields) = value.as_object() else {
            debug!("Ignoring non-object scrape request body");
            return Self::default();
        };

        let batch = match fields.get("batch") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(match raw.as_i64() {
                Some(n) => BatchParam::Number(n),
                None => BatchParam::Malformed(raw.to_string()),
            }),
        };

        Self {
            batch,
            force_refresh: flag(fields, "forceRefresh"),
            merge_all: flag(fields, "mergeAll"),
        }
    }

    /// Requested batch, or [`DEFAULT_BATCH`] when the field was absent.
    pub fn batch_or_default(&self) -> BatchParam {
        self.batch
            .clone()
            .unwrap_or(BatchParam::Number(DEFAULT_BATCH))
    }
}

fn flag(fields: &Map<String, Value>, name: &str) -> bool {
    match fields.get(name) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            debug!("Ignoring non-boolean {}: {}", name, other);
            false
        }
    }
}

/// Every cached batch concatenated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub success: bool,
    pub tools: Vec<Product>,
    pub total_found: usize,
    pub batches_found: usize,
    pub all_batches_complete: bool,
    pub message: String,
    pub mode: &'static str,
}

/// A batch served from the cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse {
    pub success: bool,
    pub tools: Vec<Product>,
    pub total_found: usize,
    pub batch: u32,
    pub cached: bool,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// A batch scraped just now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshResponse {
    pub success: bool,
    pub tools: Vec<Product>,
    pub total_found: usize,
    pub batch: u32,
    pub category_stats: BTreeMap<String, usize>,
    pub categories_scraped: usize,
    pub message: String,
    /// Milliseconds.
    pub elapsed_time: u64,
    pub cached: bool,
}

/// A scrape that found nothing. Still HTTP 200.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftFailureResponse {
    pub success: bool,
    pub tools: Vec<Product>,
    pub total_found: usize,
    pub batch: u32,
    pub category_stats: BTreeMap<String, usize>,
    pub message: String,
    /// Milliseconds.
    pub elapsed_time: u64,
}

/// Successful (HTTP 200) outcomes of a scrape request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScrapeResponse {
    Merge(MergeResponse),
    Cached(CachedResponse),
    Fresh(FreshResponse),
    SoftFailure(SoftFailureResponse),
}

impl ScrapeResponse {
    pub fn success(&self) -> bool {
        match self {
            Self::Merge(r) => r.success,
            Self::Cached(r) => r.success,
            Self::Fresh(r) => r.success,
            Self::SoftFailure(r) => r.success,
        }
    }

    pub fn tools(&self) -> &[Product] {
        match self {
            Self::Merge(r) => &r.tools,
            Self::Cached(r) => &r.tools,
            Self::Fresh(r) => &r.tools,
            Self::SoftFailure(r) => &r.tools,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Merge(r) => &r.message,
            Self::Cached(r) => &r.message,
            Self::Fresh(r) => &r.message,
            Self::SoftFailure(r) => &r.message,
        }
    }
}

/// Body sent with 4xx/5xx responses.
#[derive(Debug, Clone, Serialize)]
pub struct HardFailure {
    pub success: bool,
    pub error: String,
    pub tools: Vec<Product>,
}

impl HardFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            tools: Vec::new(),
        }
    }
}
