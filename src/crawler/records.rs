//! Page records produced by a crawl

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// One crawled page
///
/// Created once per page and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    /// Reference returned by the object store for the page snapshot
    pub thumbnail_ref: String,
}

impl PageRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        thumbnail_ref: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            thumbnail_ref: thumbnail_ref.into(),
        }
    }
}

/// Append-only collection of the records of one crawl
pub trait PageRecordStore: Send + Sync {
    fn append(&self, record: PageRecord);

    /// Returns a copy of every record in insertion order
    fn records(&self) -> Vec<PageRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every record
    fn clear(&self);
}

/// In-memory `PageRecordStore`
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<PageRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PageRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PageRecordStore for MemoryRecordStore {
    fn append(&self, record: PageRecord) {
        self.lock().push(record);
    }

    fn records(&self) -> Vec<PageRecord> {
        self.lock().clone()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn clear(&self) {
        self.lock().clear();
    }
}
