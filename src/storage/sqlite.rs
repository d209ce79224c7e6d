//! SQLite record sink
//!
//! Persists every completed crawl as a `crawl_data` row holding the owner,
//! the site URL, the serialized tree and the first snapshot reference.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordSink, StorageResult};
use crate::storage::CrawlRecord;
use crate::tree::SiteTree;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// SQLite-backed `RecordSink`
///
/// The connection is guarded by a mutex so the sink can be shared with the
/// orchestrator's blocking persistence calls.
pub struct SqliteRecordSink {
    conn: Mutex<Connection>,
}

impl SqliteRecordSink {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteRecordSink)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lists the most recent crawls, newest first
    pub fn list_crawls(&self, limit: usize) -> StorageResult<Vec<CrawlRecord>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(
            "SELECT id, user_id, site_url, json_data, thumbnail_path, created_at
             FROM crawl_data ORDER BY id DESC LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok(CrawlRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                site_url: row.get(2)?,
                json_data: row.get(3)?,
                thumbnail_path: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of persisted crawls
    pub fn count_crawls(&self) -> StorageResult<u64> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM crawl_data", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl RecordSink for SqliteRecordSink {
    fn persist(&self, owner: &str, site_url: &str, tree: &SiteTree) -> StorageResult<()> {
        let json_data = serde_json::to_string(tree)?;
        let thumbnail_path = tree.first_thumbnail_ref();
        let created_at = Utc::now().to_rfc3339();

        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO crawl_data (user_id, site_url, json_data, thumbnail_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![owner, site_url, json_data, thumbnail_path, created_at],
        )?;

        tracing::debug!("Persisted crawl of {} for {}", site_url, owner);
        Ok(())
    }
}
