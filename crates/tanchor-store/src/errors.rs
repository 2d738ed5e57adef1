//! Error handling for tanchor-store
//!
//! Wraps tanchor-core `TaError` with store-specific helpers

use tanchor_core::errors::{TaError, TaErrorKind};

/// Result type alias using TaError
pub type Result<T> = std::result::Result<T, TaError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> TaError {
    TaError::new(TaErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error for an already-applied migration
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> TaError {
    TaError::new(TaErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> TaError {
    TaError::new(TaErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> TaError {
    TaError::new(TaErrorKind::Persistence)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// A stored column could not be decoded into the domain model
pub fn corrupt_row(column: &str, reason: impl std::fmt::Display) -> TaError {
    TaError::new(TaErrorKind::Persistence)
        .with_op("row_decode")
        .with_message(format!("Invalid value in column {}: {}", column, reason))
}

/// The connection mutex was poisoned by a panicking holder
pub fn lock_poisoned() -> TaError {
    TaError::new(TaErrorKind::Concurrency)
        .with_op("sqlite_lock")
        .with_message("Connection lock poisoned")
}
