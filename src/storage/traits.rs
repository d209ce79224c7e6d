//! Storage traits and error types
//!
//! This module defines the two storage seams used by a crawl: the object
//! store that receives page snapshots, and the record sink that receives the
//! finished site tree.

use crate::tree::SiteTree;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object storage for page snapshots
///
/// Implementations must be safe to share between the worker and any number
/// of concurrent crawls.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key`
    ///
    /// # Returns
    ///
    /// A reference to the stored object, recorded as the page's thumbnail
    /// reference.
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> StorageResult<String>;
}

/// Durable sink for finished crawls
///
/// Called once per completed task from a blocking thread. A failure here is
/// logged by the caller and never changes the task outcome.
pub trait RecordSink: Send + Sync {
    /// Persists the tree built for `site_url` on behalf of `owner`
    fn persist(&self, owner: &str, site_url: &str, tree: &SiteTree) -> StorageResult<()>;
}
