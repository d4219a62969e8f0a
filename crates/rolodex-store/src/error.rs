//! Error types for the store module.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lock guarding the connection or the in-memory state was poisoned.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// The blocking task running a query failed to complete.
    #[error("blocking task failed: {0}")]
    Blocking(String),

    /// No contact partition exists for this owner.
    #[error("no contact partition for owner {0}")]
    UnknownPartition(String),

    /// The owner's partition could not be created.
    #[error("failed to provision partition {key}: {reason}")]
    Provision { key: String, reason: String },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same operation could succeed.
    ///
    /// Only SQLite `BUSY` and `LOCKED` qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// A `SQLITE_BUSY` failure, as produced by a contended database.
    pub fn busy(detail: impl Into<String>) -> Self {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some(detail.into()),
        ))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
