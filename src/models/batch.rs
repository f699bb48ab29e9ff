//! Batch identifiers and cached batch records.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// Prefix of the synthetic cache key stored in the `category` column.
const CACHE_KEY_PREFIX: &str = "batch_";

/// Number of a scrape batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchNumber(u32);

impl BatchNumber {
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Cache key for this batch (`batch_<N>`).
    pub fn cache_key(self) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, self.0)
    }

    /// Parse a `batch_<N>` cache key.
    pub fn from_cache_key(key: &str) -> Option<Self> {
        key.strip_prefix(CACHE_KEY_PREFIX)
            .and_then(|n| n.parse().ok())
            .map(Self)
    }
}

impl fmt::Display for BatchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One cached scrape run for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    pub id: String,
    pub batch: BatchNumber,
    pub products: Vec<Product>,
    /// Cardinality of `products` at write time.
    pub total_products: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
    pub update_status: Option<String>,
}

impl BatchRecord {
    /// Status recorded for rows written by a successful scrape.
    pub const STATUS_COMPLETED: &'static str = "completed";

    /// Build a fresh record for `products`, valid for `ttl` from `now`.
    ///
    /// `now` is truncated to microseconds, the precision stored on disk.
    pub fn new(
        batch: BatchNumber,
        products: Vec<Product>,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        let now = now.trunc_subsecs(6);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            batch,
            total_products: products.len(),
            products,
            created_at: now,
            expires_at: now + ttl,
            last_updated: Some(now),
            update_status: Some(Self::STATUS_COMPLETED.to_string()),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
