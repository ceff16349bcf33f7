//! Key-value storage abstraction for offsync.
//!
//! This module provides the durable local storage the queue and snapshot
//! cache persist into (file-backed, in-memory for testing).
//!
//! # Design
//!
//! The store trait is async and value-oriented:
//! - `get()` reads the whole value under a key
//! - `set()` replaces the whole value under a key
//! - `remove()` deletes a key
//!
//! There are no partial updates and no transactions across keys. Callers
//! read-modify-write the entire value; `set()` is treated as atomic.
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::new();
//! store.set("offsync.outbox", "[]").await?;
//! let raw = store.get("offsync.outbox").await?;
//! ```

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Durable string-keyed storage.
///
/// Implementations must persist values across process restarts (except
/// test doubles) and must never leave a partially written value behind.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, or `None` if it was never set.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value under `key`.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}
