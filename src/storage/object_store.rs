//! Object store implementations
//!
//! - `FsObjectStore`: writes snapshots below a local directory
//! - `MemoryObjectStore`: keeps snapshots in memory (tests and dry runs)

use crate::storage::traits::{ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Object store backed by a local directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`
    ///
    /// The directory is created lazily on the first upload.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key to a path below the root, rejecting escapes
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let is_safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> StorageResult<String> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!("Stored snapshot {} at {}", key, path.display());
        Ok(key.to_string())
    }
}

/// In-memory object store
///
/// Thread-safe via `RwLock`. `set_failing(true)` makes every upload fail,
/// which lets callers exercise the storage error path.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent uploads succeed or fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the stored bytes for `key`, if any
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns all stored keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> StorageResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "object store unavailable".to_string(),
            });
        }

        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes);
        Ok(key.to_string())
    }
}
