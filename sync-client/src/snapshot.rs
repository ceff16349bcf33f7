//! Snapshot cache for offline browsing.
//!
//! Keeps one complete copy of the viewable state under a single storage
//! key. A refresh replaces the stored document wholesale; a failed refresh
//! leaves the previous snapshot in place.

use offsync_types::{unix_millis, OfflineSnapshot, StateSnapshot};
use std::sync::Arc;

use crate::error::{StorageError, StorageResult};
use crate::store::KeyValueStore;

/// Read access to the UI-facing state the snapshot is taken from.
///
/// Implemented for plain closures, so tests can pass `|| state.clone()`.
pub trait SnapshotSource: Send + Sync {
    /// Return the current state.
    fn capture(&self) -> StateSnapshot;
}

impl<F> SnapshotSource for F
where
    F: Fn() -> StateSnapshot + Send + Sync,
{
    fn capture(&self) -> StateSnapshot {
        self()
    }
}

/// Persisted, browsable-while-offline copy of application state.
pub struct SnapshotCache<S: KeyValueStore> {
    store: Arc<S>,
    key: String,
    max_bytes: Option<usize>,
}

impl<S: KeyValueStore> SnapshotCache<S> {
    /// Create a cache persisting under `key`.
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            max_bytes: None,
        }
    }

    /// Refuse snapshots whose serialized document exceeds `bytes`.
    pub fn with_max_bytes(mut self, bytes: usize) -> Self {
        self.max_bytes = Some(bytes);
        self
    }

    /// Capture the current state from `source`, persist it and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the store write fails, or the
    /// document is over budget. The previous snapshot is kept in that case.
    pub async fn refresh(&self, source: &dyn SnapshotSource) -> StorageResult<OfflineSnapshot> {
        let snapshot = OfflineSnapshot::capture(source.capture(), unix_millis())?;
        let raw = snapshot.to_json()?;

        if let Some(limit) = self.max_bytes {
            if raw.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    key: self.key.clone(),
                    size: raw.len(),
                    limit,
                });
            }
        }

        self.store.set(&self.key, &raw).await?;
        tracing::info!(
            "Offline snapshot refreshed: {} items, {} bytes",
            snapshot.items.len(),
            snapshot.size_bytes
        );
        Ok(snapshot)
    }

    /// Read the persisted snapshot.
    ///
    /// Returns `None` when nothing is stored, the stored document does not
    /// parse, or the store cannot be read. Failures are logged, never raised.
    pub async fn load(&self) -> Option<OfflineSnapshot> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Could not read offline snapshot: {}", e);
                return None;
            }
        };

        match OfflineSnapshot::from_json(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Ignoring unreadable offline snapshot under {}: {}", self.key, e);
                None
            }
        }
    }

    /// Delete the persisted snapshot.
    pub async fn clear(&self) -> StorageResult<()> {
        self.store.remove(&self.key).await?;
        tracing::info!("Offline snapshot cleared");
        Ok(())
    }
}
