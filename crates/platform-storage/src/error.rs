//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database query error: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound("record not found".to_string()),
            sqlx::Error::Database(db_err) => StorageError::Query(db_err.message().to_string()),
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
                StorageError::Connection(err.to_string())
            }
            other => StorageError::Query(other.to_string()),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
