//! # Tablemerge - keyed batch persistence for SQLite
//!
//! Tablemerge merges periodically collected rows into long-lived SQLite tables.
//!
//! Tablemerge provides:
//! - Schema-driven table provisioning from typed column declarations
//! - Insert-or-replace batch writes keyed by the table's primary key
//! - A legacy create-then-insert path for tables that were never provisioned
//! - A small CLI driven by a TOML config and JSON batch files

pub mod types;
pub mod schema;
pub mod batch;
pub mod catalog;
pub mod provision;
pub mod writer;
pub mod connection;
pub mod config;
pub mod ingest;
pub mod ui;

// Re-exports for convenient access
pub use types::{ColumnType, Value};
pub use schema::{Column, ColumnSchema, PrimaryKeySpec};
pub use batch::RowBatch;
pub use provision::{ensure_table, Provisioned};
pub use writer::{write_batch, WriteOutcome, WritePath};

use rusqlite::ErrorCode;

/// Result type alias for Tablemerge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tablemerge operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store is unreachable, locked or busy. Retrying after reconnecting may succeed.
    #[error("Connection failure: {0}")]
    ConnectionFailure(#[source] rusqlite::Error),

    /// A table could not be created with the requested shape.
    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    /// The batch is not rectangular or carries values of the wrong type.
    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    #[error("Statement rejected: {source}")]
    StatementRejected {
        statement: Option<String>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid table name: {0:?}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify a store error raised while running `statement`.
    pub(crate) fn from_store(err: rusqlite::Error, statement: &str) -> Self {
        if is_connection_error(&err) {
            return Error::ConnectionFailure(err);
        }
        Error::StatementRejected {
            statement: Some(statement.to_string()),
            source: err,
        }
    }

    /// Only connection failures are worth retrying without caller intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConnectionFailure(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if is_connection_error(&err) {
            return Error::ConnectionFailure(err);
        }
        Error::StatementRejected {
            statement: None,
            source: err,
        }
    }
}

fn is_connection_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(ffi, _) => matches!(
            ffi.code,
            ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied
        ),
        rusqlite::Error::InvalidPath(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_is_retryable() {
        let err = Error::from(failure(rusqlite::ffi::SQLITE_BUSY));
        assert!(err.is_retryable());
        assert!(matches!(err, Error::ConnectionFailure(_)));
    }

    #[test]
    fn test_constraint_is_rejected() {
        let err = Error::from_store(failure(rusqlite::ffi::SQLITE_CONSTRAINT), "INSERT INTO t VALUES (1)");
        assert!(!err.is_retryable());
        match err {
            Error::StatementRejected { statement, .. } => {
                assert_eq!(statement.as_deref(), Some("INSERT INTO t VALUES (1)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
