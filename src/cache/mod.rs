//! Weekly cache of scraped batches.
//!
//! Each batch is stored under the synthetic key `batch_<N>`. A row is live
//! until its `expires_at`; expired rows are ignored by lookups and only
//! removed by an explicit purge.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

pub use memory::InMemoryBatchCache;
pub use sqlite::DieselBatchCache;

use crate::models::{BatchNumber, BatchRecord, Product};
use crate::registry::BatchRegistry;

/// Default time-to-live of a cached batch.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Longest accepted time-to-live; larger configured values are clamped.
pub const MAX_TTL_DAYS: i64 = 3650;

/// Errors from a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage for batch records.
#[async_trait]
pub trait BatchCacheBackend: Send + Sync {
    /// Most recently created record for `batch` whose expiry is after `now`.
    async fn latest_unexpired(
        &self,
        batch: BatchNumber,
        now: DateTime<Utc>,
    ) -> Result<Option<BatchRecord>, CacheError>;

    /// Remove every record for `batch`, expired or not. Returns rows removed.
    async fn delete_batch(&self, batch: BatchNumber) -> Result<usize, CacheError>;

    async fn insert(&self, record: &BatchRecord) -> Result<(), CacheError>;

    /// Remove every record with `expires_at <= now`. Returns rows removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError>;
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(BatchRecord),
    Miss,
    /// The backend failed; the caller decides whether to treat it as a miss.
    Error(String),
}

/// Every cached batch concatenated.
#[derive(Debug, Clone, Default)]
pub struct MergedBatches {
    pub products: Vec<Product>,
    pub batches_found: usize,
    pub all_batches_complete: bool,
}

/// Cache state of one registry batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatus {
    pub batch: BatchNumber,
    pub cached: bool,
    pub total_products: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Batch cache bound to a registry and a TTL.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn BatchCacheBackend>,
    registry: Arc<BatchRegistry>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn BatchCacheBackend>, registry: Arc<BatchRegistry>, ttl: Duration) -> Self {
        Self {
            backend,
            registry,
            ttl,
        }
    }

    /// Store backed by process memory, with the default TTL.
    pub fn in_memory(registry: Arc<BatchRegistry>) -> Self {
        Self::new(
            Arc::new(InMemoryBatchCache::new()),
            registry,
            Duration::days(DEFAULT_TTL_DAYS),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn registry(&self) -> &Arc<BatchRegistry> {
        &self.registry
    }

    /// Newest unexpired record for `batch`.
    pub async fn lookup_batch(&self, batch: BatchNumber) -> CacheLookup {
        self.lookup_batch_at(batch, Utc::now()).await
    }

    pub async fn lookup_batch_at(&self, batch: BatchNumber, now: DateTime<Utc>) -> CacheLookup {
        match self.backend.latest_unexpired(batch, now).await {
            Ok(Some(record)) => CacheLookup::Hit(record),
            Ok(None) => CacheLookup::Miss,
            Err(e) => CacheLookup::Error(e.to_string()),
        }
    }

    /// Supersede whatever is cached for `batch` with `products`.
    ///
    /// Delete and insert are separate statements; a concurrent writer for the
    /// same batch can leave two live rows, of which lookups return the newest.
    pub async fn replace_batch(
        &self,
        batch: BatchNumber,
        products: Vec<Product>,
    ) -> Result<BatchRecord, CacheError> {
        self.replace_batch_at(batch, products, Utc::now()).await
    }

    pub async fn replace_batch_at(
        &self,
        batch: BatchNumber,
        products: Vec<Product>,
        now: DateTime<Utc>,
    ) -> Result<BatchRecord, CacheError> {
        let removed = self.backend.delete_batch(batch).await?;
        if removed > 0 {
            debug!("Removed {} cached rows for batch {}", removed, batch);
        }

        let record = BatchRecord::new(batch, products, now, self.ttl);
        self.backend.insert(&record).await?;
        info!(
            "Cached {} products for batch {} until {}",
            record.total_products, batch, record.expires_at
        );
        Ok(record)
    }

    /// Concatenate every live batch in registry order.
    ///
    /// Lookup errors count as missing batches.
    pub async fn merge_all(&self) -> MergedBatches {
        let now = Utc::now();
        let mut merged = MergedBatches::default();

        for batch in self.registry.batch_numbers() {
            match self.lookup_batch_at(batch, now).await {
                CacheLookup::Hit(record) => {
                    merged.batches_found += 1;
                    merged.products.extend(record.products);
                }
                CacheLookup::Miss => {}
                CacheLookup::Error(reason) => {
                    tracing::warn!("Cache lookup for batch {} failed: {}", batch, reason);
                }
            }
        }

        merged.all_batches_complete = merged.batches_found == self.registry.len();
        merged
    }

    /// Per-batch cache state for every registry batch.
    pub async fn status(&self) -> Vec<BatchStatus> {
        let now = Utc::now();
        let mut statuses = Vec::with_capacity(self.registry.len());

        for batch in self.registry.batch_numbers() {
            let status = match self.lookup_batch_at(batch, now).await {
                CacheLookup::Hit(record) => BatchStatus {
                    batch,
                    cached: true,
                    total_products: record.total_products,
                    created_at: Some(record.created_at),
                    expires_at: Some(record.expires_at),
                    error: None,
                },
                CacheLookup::Miss => BatchStatus {
                    batch,
                    cached: false,
                    total_products: 0,
                    created_at: None,
                    expires_at: None,
                    error: None,
                },
                CacheLookup::Error(reason) => BatchStatus {
                    batch,
                    cached: false,
                    total_products: 0,
                    created_at: None,
                    expires_at: None,
                    error: Some(reason),
                },
            };
            statuses.push(status);
        }

        statuses
    }

    /// Physically remove expired rows.
    pub async fn purge_expired(&self) -> Result<usize, CacheError> {
        let removed = self.backend.purge_expired(Utc::now()).await?;
        info!("Purged {} expired cache rows", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::Product;

    fn product(name: &str) -> Product {
        Product {
            name: name.to_string(),
            price: "£12.50".to_string(),
            availability: "In Stock".to_string(),
            image: "/placeholder.svg".to_string(),
            product_url: None,
            description: String::new(),
            supplier: "Screwfix".to_string(),
            category: "Hand Tools".to_string(),
            last_updated: "2026-01-05T10:00:00.000000Z".to_string(),
            features: Vec::new(),
            specifications: Default::default(),
        }
    }

    fn store() -> CacheStore {
        CacheStore::in_memory(Arc::new(BatchRegistry::default()))
    }

    #[tokio::test]
    async fn test_lookup_miss_on_empty_cache() {
        let store = store();
        assert!(matches!(
            store.lookup_batch(BatchNumber::new(1)).await,
            CacheLookup::Miss
        ));
    }

    #[tokio::test]
    async fn test_replace_then_lookup() {
        let store = store();
        let written = store
            .replace_batch(BatchNumber::new(1), vec![product("Pliers"), product("Knife")])
            .await
            .unwrap();
        assert_eq!(written.total_products, 2);
        assert_eq!(written.expires_at - written.created_at, Duration::days(7));

        match store.lookup_batch(BatchNumber::new(1)).await {
            CacheLookup::Hit(record) => {
                assert_eq!(record.id, written.id);
                assert_eq!(record.products, written.products);
                assert_eq!(record.total_products, record.products.len());
            }
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_replace_twice_keeps_latest() {
        let store = store();
        let batch = BatchNumber::new(2);
        store.replace_batch(batch, vec![product("Old")]).await.unwrap();
        let second = store
            .replace_batch(batch, vec![product("New A"), product("New B")])
            .await
            .unwrap();

        let CacheLookup::Hit(record) = store.lookup_batch(batch).await else {
            panic!("expected hit");
        };
        assert_eq!(record.id, second.id);
        assert_eq!(record.total_products, 2);
    }

    #[tokio::test]
    async fn test_expired_record_is_a_miss() {
        let store = store();
        let batch = BatchNumber::new(1);
        let written_at = Utc::now() - Duration::days(8);
        store
            .replace_batch_at(batch, vec![product("Stale")], written_at)
            .await
            .unwrap();

        assert!(matches!(store.lookup_batch(batch).await, CacheLookup::Miss));
        // exactly at expiry is already expired
        assert!(matches!(
            store
                .lookup_batch_at(batch, written_at + Duration::days(7))
                .await,
            CacheLookup::Miss
        ));
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_with_missing_batch() {
        let store = store();
        store
            .replace_batch(BatchNumber::new(1), vec![product("A"), product("B")])
            .await
            .unwrap();
        store
            .replace_batch(BatchNumber::new(2), vec![product("C")])
            .await
            .unwrap();

        let merged = store.merge_all().await;
        assert_eq!(merged.batches_found, 2);
        assert!(!merged.all_batches_complete);
        let names: Vec<&str> = merged.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_merge_complete() {
        let store = store();
        for n in 1..=3 {
            store
                .replace_batch(BatchNumber::new(n), vec![product("X")])
                .await
                .unwrap();
        }
        let merged = store.merge_all().await;
        assert_eq!(merged.batches_found, 3);
        assert!(merged.all_batches_complete);
        assert_eq!(merged.products.len(), 3);
    }

    #[tokio::test]
    async fn test_status_reports_every_batch() {
        let store = store();
        store
            .replace_batch(BatchNumber::new(3), vec![product("X")])
            .await
            .unwrap();

        let statuses = store.status().await;
        assert_eq!(statuses.len(), 3);
        assert!(!statuses[0].cached);
        assert!(!statuses[1].cached);
        assert!(statuses[2].cached);
        assert_eq!(statuses[2].total_products, 1);
        assert!(statuses[2].expires_at.is_some());
    }
}
