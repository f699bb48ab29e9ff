//! Diesel-backed cache backend for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::{BatchCacheBackend, CacheError};
use crate::models::{format_timestamp, parse_timestamp, BatchNumber, BatchRecord, Product};
use crate::repository::{AsyncSqlitePool, BatchCacheRow, NewBatchCacheRow};
use crate::schema::tools_weekly_cache;

/// Cache backend over the `tools_weekly_cache` table.
#[derive(Clone)]
pub struct DieselBatchCache {
    pool: AsyncSqlitePool,
}

impl DieselBatchCache {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Number of rows stored for `batch`, live or expired.
    pub async fn row_count(&self, batch: BatchNumber) -> Result<i64, CacheError> {
        let mut conn = self.pool.get().await?;
        let key = batch.cache_key();

        let count = tools_weekly_cache::table
            .filter(tools_weekly_cache::category.eq(key.as_str()))
            .count()
            .get_result(&mut conn)
            .await?;

        Ok(count)
    }
}

impl TryFrom<BatchCacheRow> for BatchRecord {
    type Error = CacheError;

    fn try_from(row: BatchCacheRow) -> Result<Self, Self::Error> {
        let products: Vec<Product> = serde_json::from_str(&row.tools_data)?;
        // Rows are only ever read through their own key.
        let batch = BatchNumber::from_cache_key(&row.category).unwrap_or(BatchNumber::new(0));

        Ok(BatchRecord {
            id: row.id,
            batch,
            products,
            total_products: usize::try_from(row.total_products).unwrap_or(0),
            created_at: parse_timestamp(&row.created_at),
            expires_at: parse_timestamp(&row.expires_at),
            last_updated: row.last_updated.as_deref().map(parse_timestamp),
            update_status: row.update_status,
        })
    }
}

#[async_trait]
impl BatchCacheBackend for DieselBatchCache {
    async fn latest_unexpired(
        &self,
        batch: BatchNumber,
        now: DateTime<Utc>,
    ) -> Result<Option<BatchRecord>, CacheError> {
        let mut conn = self.pool.get().await?;
        let key = batch.cache_key();
        let now = format_timestamp(&now);

        let row = tools_weekly_cache::table
            .filter(tools_weekly_cache::category.eq(key.as_str()))
            .filter(tools_weekly_cache::expires_at.gt(now.as_str()))
            .order(tools_weekly_cache::created_at.desc())
            .select(BatchCacheRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        row.map(BatchRecord::try_from).transpose()
    }

    async fn delete_batch(&self, batch: BatchNumber) -> Result<usize, CacheError> {
        let mut conn = self.pool.get().await?;
        let key = batch.cache_key();

        let removed = diesel::delete(
            tools_weekly_cache::table.filter(tools_weekly_cache::category.eq(key.as_str())),
        )
        .execute(&mut conn)
        .await?;

        Ok(removed)
    }

    async fn insert(&self, record: &BatchRecord) -> Result<(), CacheError> {
        let tools_data = serde_json::to_string(&record.products)?;
        let key = record.batch.cache_key();
        let created_at = format_timestamp(&record.created_at);
        let expires_at = format_timestamp(&record.expires_at);
        let last_updated = record.last_updated.as_ref().map(format_timestamp);

        let row = NewBatchCacheRow {
            id: &record.id,
            category: &key,
            tools_data: &tools_data,
            total_products: i32::try_from(record.total_products).unwrap_or(i32::MAX),
            created_at: &created_at,
            expires_at: &expires_at,
            last_updated: last_updated.as_deref(),
            update_status: record.update_status.as_deref(),
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(tools_weekly_cache::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut conn = self.pool.get().await?;
        let now = format_timestamp(&now);

        let removed = diesel::delete(
            tools_weekly_cache::table.filter(tools_weekly_cache::expires_at.le(now.as_str())),
        )
        .execute(&mut conn)
        .await?;

        Ok(removed)
    }
}
