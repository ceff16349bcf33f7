//! In-memory store for testing.
//!
//! Allows injecting read/write failures and a storage quota.

use super::KeyValueStore;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory key-value store.
///
/// Clones share the same underlying map, so a test can keep a handle to
/// inspect or corrupt what a component persisted.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    values: HashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
    fail_next_set: Option<String>,
    fail_next_get: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a raw value, bypassing quota and failure injection.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock().values.insert(key.to_string(), value.to_string());
    }

    /// Read a raw value.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().values.contains_key(key)
    }

    /// Number of successful `set()` calls.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Reject values larger than `bytes` with [`StorageError::QuotaExceeded`].
    pub fn set_quota(&self, bytes: usize) {
        self.lock().quota = Some(bytes);
    }

    /// Cause the next `set()` to fail with the given error.
    pub fn fail_next_set(&self, error: &str) {
        self.lock().fail_next_set = Some(error.to_string());
    }

    /// Cause the next `get()` to fail with the given error.
    pub fn fail_next_get(&self, error: &str) {
        self.lock().fail_next_get = Some(error.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut inner = self.lock();

        if let Some(error) = inner.fail_next_get.take() {
            return Err(StorageError::Backend(error));
        }

        Ok(inner.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.lock();

        if let Some(error) = inner.fail_next_set.take() {
            return Err(StorageError::Backend(error));
        }

        if let Some(limit) = inner.quota {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }

        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock().values.remove(key);
        Ok(())
    }
}
