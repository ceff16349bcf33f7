//! Durable action queue (outbox).
//!
//! Every mutation rewrites the full serialized list under one storage key.
//! The new list is built on a copy and only adopted after the write
//! succeeded, so a failed write leaves both the stored and the in-memory
//! queue exactly as they were.

use offsync_core::{ActionLog, IdGenerator};
use offsync_types::{decode_queue, encode_queue, unix_millis, ActionId, PendingAction};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::error::StorageResult;
use crate::store::KeyValueStore;

/// Ordered, persisted buffer of actions that could not be applied yet.
pub struct ActionQueue<S: KeyValueStore> {
    store: Arc<S>,
    key: String,
    state: Mutex<QueueState>,
    len_tx: watch::Sender<usize>,
}

struct QueueState {
    log: ActionLog,
    ids: IdGenerator,
}

impl<S: KeyValueStore> ActionQueue<S> {
    /// Load the queue persisted under `key`.
    ///
    /// A missing or unparsable value yields an empty queue. Errors from the
    /// store itself are returned.
    pub async fn open(store: Arc<S>, key: impl Into<String>) -> StorageResult<Self> {
        let key = key.into();
        let actions = match store.get(&key).await? {
            Some(raw) => match decode_queue(&raw) {
                Ok(actions) => actions,
                Err(e) => {
                    tracing::warn!("Discarding unreadable queue under {}: {}", key, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        tracing::debug!("Loaded {} pending actions from {}", actions.len(), key);

        let ids = IdGenerator::seeded(&actions);
        let (len_tx, _) = watch::channel(actions.len());
        Ok(Self {
            store,
            key,
            state: Mutex::new(QueueState {
                log: ActionLog::from_actions(actions),
                ids,
            }),
            len_tx,
        })
    }

    /// Append an action to the end of the queue.
    ///
    /// Returns the stored record including its assigned id.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails; the queue is unchanged.
    pub async fn enqueue(&self, action_type: &str, payload: Value) -> StorageResult<PendingAction> {
        let mut state = self.state.lock().await;
        let QueueState { log, ids } = &mut *state;

        let mut next = log.clone();
        let action = next.append(ids, action_type, payload, unix_millis());
        self.persist(&next).await?;
        *log = next;

        tracing::debug!("Queued {} ({:?})", action.action_type, action.id);
        self.len_tx.send_replace(log.len());
        Ok(action)
    }

    /// A copy of the queue in FIFO order.
    pub async fn list_pending(&self) -> Vec<PendingAction> {
        self.state.lock().await.log.as_slice().to_vec()
    }

    /// The oldest queued action.
    pub async fn head(&self) -> Option<PendingAction> {
        self.state.lock().await.log.head().cloned()
    }

    /// Remove the action with `id`.
    ///
    /// Absent ids are a no-op returning `Ok(false)`, which makes retries after
    /// an interrupted drain safe.
    pub async fn remove(&self, id: ActionId) -> StorageResult<bool> {
        let mut state = self.state.lock().await;

        let mut next = state.log.clone();
        if !next.remove(id) {
            return Ok(false);
        }
        self.persist(&next).await?;
        state.log = next;

        tracing::debug!("Removed {:?} from queue", id);
        self.len_tx.send_replace(state.log.len());
        Ok(true)
    }

    /// Empty the whole queue.
    ///
    /// Destructive and irreversible; only for explicit user requests.
    pub async fn clear(&self) -> StorageResult<()> {
        let mut state = self.state.lock().await;

        let next = ActionLog::new();
        self.persist(&next).await?;
        let dropped = state.log.len();
        state.log = next;

        tracing::info!("Cleared {} pending actions", dropped);
        self.len_tx.send_replace(0);
        Ok(())
    }

    /// Number of queued actions.
    pub async fn len(&self) -> usize {
        self.state.lock().await.log.len()
    }

    /// Check if the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.log.is_empty()
    }

    /// Watch the queue length (for a "N pending actions" indicator).
    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }

    /// Last published queue length, without waiting for the queue lock.
    pub fn cached_len(&self) -> usize {
        *self.len_tx.borrow()
    }

    async fn persist(&self, log: &ActionLog) -> StorageResult<()> {
        let raw = encode_queue(log.as_slice())?;
        self.store.set(&self.key, &raw).await?;
        tracing::debug!("Persisted {} actions ({} bytes)", log.len(), raw.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::store::{FileStore, MemoryStore};
    use serde_json::json;

    const KEY: &str = "offsync.outbox";

    async fn open(store: &MemoryStore) -> ActionQueue<MemoryStore> {
        ActionQueue::open(Arc::new(store.clone()), KEY).await.unwrap()
    }

    fn kinds(actions: &[PendingAction]) -> Vec<&str> {
        actions.iter().map(|a| a.action_type.as_str()).collect()
    }

    // ===========================================
    // Enqueue Tests
    // ===========================================

    #[tokio::test]
    async fn enqueue_appends_in_order() {
        let store = MemoryStore::new();
        let queue = open(&store).await;

        queue.enqueue("a", json!(1)).await.unwrap();
        queue.enqueue("b", json!(2)).await.unwrap();
        queue.enqueue("c", json!(3)).await.unwrap();

        assert_eq!(kinds(&queue.list_pending().await), vec!["a", "b", "c"]);
        assert_eq!(queue.len().await, 3);
    }

    #[tokio::test]
    async fn enqueue_returns_record_with_increasing_ids() {
        let store = MemoryStore::new();
        let queue = open(&store).await;

        let first = queue.enqueue("a", json!(null)).await.unwrap();
        let second = queue.enqueue("b", json!(null)).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(queue.head().await, Some(first));
    }

    #[tokio::test]
    async fn enqueue_persists_full_list() {
        let store = MemoryStore::new();
        let queue = open(&store).await;

        queue.enqueue("a", json!({ "x": 1 })).await.unwrap();
        queue.enqueue("b", json!({ "x": 2 })).await.unwrap();

        let persisted = decode_queue(&store.raw(KEY).unwrap()).unwrap();
        assert_eq!(persisted, queue.list_pending().await);
    }

    #[tokio::test]
    async fn failed_write_leaves_queue_unchanged() {
        let store = MemoryStore::new();
        let queue = open(&store).await;
        queue.enqueue("a", json!(1)).await.unwrap();
        let stored_before = store.raw(KEY);

        store.fail_next_set("quota exceeded");
        let result = queue.enqueue("b", json!(2)).await;

        assert!(matches!(result, Err(StorageError::Backend(_))));
        assert_eq!(kinds(&queue.list_pending().await), vec!["a"]);
        assert_eq!(store.raw(KEY), stored_before);
    }

    #[tokio::test]
    async fn quota_exceeded_is_surfaced() {
        let store = MemoryStore::new();
        store.set_quota(16);
        let queue = open(&store).await;

        let result = queue.enqueue("buy_pixel", json!({ "big": "x".repeat(64) })).await;

        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert!(queue.is_empty().await);
    }

    // ===========================================
    // Remove / Clear Tests
    // ===========================================

    #[tokio::test]
    async fn remove_drops_exactly_one() {
        let store = MemoryStore::new();
        let queue = open(&store).await;
        queue.enqueue("a", json!(1)).await.unwrap();
        let b = queue.enqueue("b", json!(2)).await.unwrap();
        queue.enqueue("c", json!(3)).await.unwrap();

        assert!(queue.remove(b.id).await.unwrap());

        assert_eq!(kinds(&queue.list_pending().await), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn remove_absent_is_no_op_without_write() {
        let store = MemoryStore::new();
        let queue = open(&store).await;
        let a = queue.enqueue("a", json!(1)).await.unwrap();
        queue.remove(a.id).await.unwrap();
        let writes = store.write_count();

        assert!(!queue.remove(a.id).await.unwrap());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn failed_remove_keeps_action() {
        let store = MemoryStore::new();
        let queue = open(&store).await;
        let a = queue.enqueue("a", json!(1)).await.unwrap();

        store.fail_next_set("io");
        assert!(queue.remove(a.id).await.is_err());

        assert_eq!(queue.head().await, Some(a));
    }

    #[tokio::test]
    async fn clear_empties_queue_and_storage() {
        let store = MemoryStore::new();
        let queue = open(&store).await;
        queue.enqueue("a", json!(1)).await.unwrap();
        queue.enqueue("b", json!(2)).await.unwrap();

        queue.clear().await.unwrap();

        assert!(queue.is_empty().await);
        assert!(decode_queue(&store.raw(KEY).unwrap()).unwrap().is_empty());
    }

    // ===========================================
    // Persistence Tests
    // ===========================================

    #[tokio::test]
    async fn reopen_restores_order_and_continues_ids() {
        let store = MemoryStore::new();
        let queue = open(&store).await;
        queue.enqueue("a", json!(1)).await.unwrap();
        let b = queue.enqueue("b", json!(2)).await.unwrap();
        drop(queue);

        let reopened = open(&store).await;
        let c = reopened.enqueue("c", json!(3)).await.unwrap();

        assert_eq!(kinds(&reopened.list_pending().await), vec!["a", "b", "c"]);
        assert!(c.id > b.id);
    }

    #[tokio::test]
    async fn reopen_from_disk_restores_queue() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
        let queue = ActionQueue::open(Arc::clone(&store), KEY).await.unwrap();
        queue
            .enqueue("a", json!({ "pixel": 7, "price": 907.3038322028689 }))
            .await
            .unwrap();
        queue.enqueue("b", json!(null)).await.unwrap();
        let expected = queue.list_pending().await;
        drop(queue);

        let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
        let reopened = ActionQueue::open(store, KEY).await.unwrap();

        let restored = reopened.list_pending().await;
        assert_eq!(restored, expected);
        assert_eq!(restored[0].payload["price"].as_f64(), Some(907.3038322028689));
    }

    #[tokio::test]
    async fn corrupt_queue_opens_empty() {
        let store = MemoryStore::new();
        store.insert_raw(KEY, "[{\"id\":");

        let queue = open(&store).await;

        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn open_surfaces_store_errors() {
        let store = MemoryStore::new();
        store.fail_next_get("io");

        let result = ActionQueue::open(Arc::new(store), KEY).await;

        assert!(result.is_err());
    }

    // ===========================================
    // Length Indicator Tests
    // ===========================================

    #[tokio::test]
    async fn length_watch_tracks_mutations() {
        let store = MemoryStore::new();
        let queue = open(&store).await;
        let rx = queue.subscribe_len();

        let a = queue.enqueue("a", json!(1)).await.unwrap();
        queue.enqueue("b", json!(2)).await.unwrap();
        assert_eq!(*rx.borrow(), 2);

        queue.remove(a.id).await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(queue.cached_len(), 1);

        queue.clear().await.unwrap();
        assert_eq!(*rx.borrow(), 0);
    }
}
