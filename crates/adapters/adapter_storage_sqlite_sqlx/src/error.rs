//! Storage-specific error type wrapping sqlx errors.

use growhub_domain::error::GrowHubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to encode or decode a stored JSON column.
    #[error("JSON column error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A counter does not fit the column type.
    #[error("value {0} does not fit in an SQLite integer")]
    Overflow(u64),
}

impl From<StorageError> for GrowHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
