//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite.

pub mod context;
pub mod models;
pub mod pool;
pub mod util;

pub use context::DbContext;
pub use models::{BatchCacheRow, NewBatchCacheRow};
pub use pool::{AsyncSqlitePool, DbError, SqliteConn};
