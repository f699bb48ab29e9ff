//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for database operations. It
//! holds the connection pool and hands out repositories.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::pool::{DbError, AsyncSqlitePool};
use crate::cache::DieselBatchCache;

/// Database context that manages the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:tools.db")?;
/// ctx.init_schema().await?;
/// let cache = ctx.batch_cache();
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn from_sqlite_path(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a context from a database URL.
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        Ok(Self {
            pool: AsyncSqlitePool::from_url(url)?,
        })
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    /// Get the batch cache repository.
    pub fn batch_cache(&self) -> DieselBatchCache {
        DieselBatchCache::new(self.pool.clone())
    }

    /// Verify a connection can be opened.
    pub async fn test_connection(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute("SELECT 1").await
    }

    /// Create tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS tools_weekly_cache (
                id TEXT PRIMARY KEY NOT NULL,
                category TEXT NOT NULL,
                tools_data TEXT NOT NULL DEFAULT '[]',
                total_products INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                last_updated TEXT,
                update_status TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tools_weekly_cache_category_expiry
                ON tools_weekly_cache(category, expires_at);
            "#,
        )
        .await
    }

    /// List user tables.
    pub async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        use diesel::sql_types::Text;
        use diesel_async::RunQueryDsl;

        #[derive(diesel::QueryableByName)]
        struct TableName {
            #[diesel(sql_type = Text)]
            name: String,
        }

        let mut conn = self.pool.get().await?;
        let rows: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .load(&mut conn)
        .await?;

        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));

        ctx.init_schema().await.unwrap();
        ctx.init_schema().await.unwrap();

        let tables = ctx.list_tables().await.unwrap();
        assert_eq!(tables, vec!["tools_weekly_cache".to_string()]);
        ctx.test_connection().await.unwrap();
    }
}
