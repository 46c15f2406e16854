//! Centralized error types for the Abraham indexer

use thiserror::Error;

/// Main indexer error type
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing {entity} `{id}` referenced by {event} event")]
    MissingAggregate {
        entity: &'static str,
        id: String,
        event: &'static str,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDB(String),

    #[error("Column family '{0}' not found")]
    MissingColumnFamily(String),
}

/// Result type alias for indexer operations
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Helper to convert rocksdb errors
impl From<rocksdb::Error> for IndexerError {
    fn from(err: rocksdb::Error) -> Self {
        IndexerError::Storage(StorageError::RocksDB(err.to_string()))
    }
}

/// Helper to convert serialization errors
impl From<bincode::Error> for IndexerError {
    fn from(err: bincode::Error) -> Self {
        IndexerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        IndexerError::Serialization(err.to_string())
    }
}
