//! Storage module for crawl artifacts
//!
//! This module handles everything a crawl writes outside the process:
//! - Page snapshots, through the `ObjectStore` trait
//! - Finished site trees, through the `RecordSink` trait
//! - SQLite database initialization and schema management

mod object_store;
mod schema;
mod sqlite;
mod traits;

pub use object_store::{FsObjectStore, MemoryObjectStore};
pub use schema::initialize_schema;
pub use sqlite::SqliteRecordSink;
pub use traits::{ObjectStore, RecordSink, StorageError, StorageResult};

use std::path::Path;

/// Opens the crawl history database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteRecordSink)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_record_sink(path: &Path) -> StorageResult<SqliteRecordSink> {
    SqliteRecordSink::new(path)
}

/// A persisted crawl, as stored in `crawl_data`
#[derive(Debug, Clone)]
pub struct CrawlRecord {
    pub id: i64,
    pub user_id: String,
    pub site_url: String,
    pub json_data: String,
    pub thumbnail_path: Option<String>,
    pub created_at: String,
}
