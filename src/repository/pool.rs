//! SQLite connection pool.
//!
//! SQLite connections are lightweight and file-based, so the pool creates a
//! new connection per operation. The SyncConnectionWrapper internally uses
//! spawn_blocking for async operation.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::AsyncConnection;

use super::util::{connection_error, pool_error};

/// Diesel error type alias.
pub type DbError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// SQLite connection factory.
#[derive(Clone, Debug)]
pub struct AsyncSqlitePool {
    database_url: String,
}

impl AsyncSqlitePool {
    /// Create a pool from a database URL.
    ///
    /// Accepts plain file paths and `sqlite:` URLs. Other schemes are rejected.
    pub fn from_url(database_url: &str) -> Result<Self, DbError> {
        let url = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);

        if url.contains("://") {
            return Err(pool_error(format!(
                "Unsupported database URL '{}': only SQLite is supported",
                database_url
            )));
        }

        Ok(Self {
            database_url: url.to_string(),
        })
    }

    /// Create a pool from a file path.
    pub fn from_path(path: &Path) -> Self {
        Self {
            database_url: path.display().to_string(),
        }
    }

    /// Get a connection.
    pub async fn get(&self) -> Result<SqliteConn, DbError> {
        SqliteConn::establish(&self.database_url)
            .await
            .map_err(|e| connection_error(&self.database_url, e))
    }

    /// Get the database URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_strips_prefix() {
        assert_eq!(
            AsyncSqlitePool::from_url("sqlite:/tmp/tools.db").unwrap().database_url(),
            "/tmp/tools.db"
        );
        assert_eq!(
            AsyncSqlitePool::from_url("sqlite:///tmp/tools.db").unwrap().database_url(),
            "/tmp/tools.db"
        );
        assert_eq!(
            AsyncSqlitePool::from_url("tools.db").unwrap().database_url(),
            "tools.db"
        );
    }

    #[test]
    fn test_from_url_rejects_other_schemes() {
        assert!(AsyncSqlitePool::from_url("postgres://localhost/tools").is_err());
    }
}
