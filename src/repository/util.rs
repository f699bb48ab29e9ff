//! Errors raised by the pool before any statement runs.

use std::fmt::Display;

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error};

/// Detail for a failure to open or address the cache database.
#[derive(Debug)]
pub struct PoolErrorInfo {
    message: String,
    database_url: Option<String>,
}

impl DatabaseErrorInformation for PoolErrorInfo {
    fn message(&self) -> &str {
        &self.message
    }
    fn details(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Wrap `message` as an unknown-kind diesel error.
pub fn pool_error(message: impl Display) -> Error {
    Error::DatabaseError(
        DatabaseErrorKind::Unknown,
        Box::new(PoolErrorInfo {
            message: message.to_string(),
            database_url: None,
        }),
    )
}

/// Failure to open `database_url`. The URL is kept as the error details.
pub fn connection_error(database_url: &str, e: impl Display) -> Error {
    Error::DatabaseError(
        DatabaseErrorKind::ClosedConnection,
        Box::new(PoolErrorInfo {
            message: e.to_string(),
            database_url: Some(database_url.to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_keeps_url() {
        let Error::DatabaseError(kind, info) = connection_error("/tmp/cache.db", "unable to open")
        else {
            panic!("expected database error");
        };
        assert!(matches!(kind, DatabaseErrorKind::ClosedConnection));
        assert_eq!(info.message(), "unable to open");
        assert_eq!(info.details(), Some("/tmp/cache.db"));
        assert_eq!(pool_error("boom").to_string(), "boom");
    }
}
