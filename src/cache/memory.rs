//! In-memory cache backend.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{BatchCacheBackend, CacheError};
use crate::models::{BatchNumber, BatchRecord};

/// Cache backend holding records in process memory. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryBatchCache {
    records: Mutex<Vec<BatchRecord>>,
}

impl InMemoryBatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<BatchRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BatchCacheBackend for InMemoryBatchCache {
    async fn latest_unexpired(
        &self,
        batch: BatchNumber,
        now: DateTime<Utc>,
    ) -> Result<Option<BatchRecord>, CacheError> {
        Ok(self
            .records()
            .iter()
            .filter(|r| r.batch == batch && !r.is_expired_at(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn delete_batch(&self, batch: BatchNumber) -> Result<usize, CacheError> {
        let mut records = self.records();
        let before = records.len();
        records.retain(|r| r.batch != batch);
        Ok(before - records.len())
    }

    async fn insert(&self, record: &BatchRecord) -> Result<(), CacheError> {
        self.records().push(record.clone());
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut records = self.records();
        let before = records.len();
        records.retain(|r| !r.is_expired_at(now));
        Ok(before - records.len())
    }
}
