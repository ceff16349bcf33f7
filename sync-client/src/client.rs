//! OfflineSync - the main interface for offsync.
//!
//! This module provides [`OfflineSync`], which wires the connectivity
//! monitor, action queue, snapshot cache and sync engine together and
//! exposes the commands and indicators the UI layer uses.
//!
//! # Architecture
//!
//! Connectivity transitions are mapped to reactions by sync-core and
//! interpreted here:
//!
//! ```text
//! platform signal → ConnectivityMonitor → react() ─┬→ Offline: cancel drain, cancel retry, refresh snapshot
//!                                                  └→ Online:  drain
//! UI action → FeatureGate ─┬→ Execute
//!                          └→ ActionQueue → SyncEngine → RemoteEndpoint
//! ```
//!
//! # Example
//!
//! ```ignore
//! use offsync_client::{MemoryStore, MockRemote, OfflineConfig, OfflineSync};
//!
//! let sync = OfflineSync::open(config, store, remote, || app.state(), ConnectivityState::Online).await?;
//! sync.start();
//!
//! match sync.dispatch("buy_pixel", "buy_pixel", payload).await? {
//!     Dispatch::Execute => api.buy_pixel(payload).await?,
//!     Dispatch::Queued(action) => println!("queued {}", action.id),
//! }
//! ```

use offsync_core::{react, FailureReason, FeatureGate, Reaction, SyncSession, SyncStatus};
use offsync_types::{
    ActionId, CodecError, ConnectivityState, OfflineSnapshot, PendingAction, PlatformSignal,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::config::OfflineConfig;
use crate::engine::SyncEngine;
use crate::error::{ClientError, StorageResult};
use crate::monitor::{ConnectivityMonitor, Subscription};
use crate::queue::ActionQueue;
use crate::remote::RemoteEndpoint;
use crate::retry::RetryScheduler;
use crate::snapshot::{SnapshotCache, SnapshotSource};
use crate::store::KeyValueStore;

/// What the caller should do with a dispatched action.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Run the action now.
    Execute,
    /// The action was recorded in the queue and will be applied by a drain.
    Queued(PendingAction),
}

/// User-facing status signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicators {
    /// Offline/online indicator.
    pub connectivity: ConnectivityState,
    /// "N pending actions".
    pub pending_actions: usize,
    /// Percentage, present only while a drain is running.
    pub drain_progress: Option<u8>,
    /// Undismissed failure of the last drain.
    pub last_failure: Option<String>,
}

/// Offline-first synchronization layer.
///
/// Cheap to clone; clones share all state.
pub struct OfflineSync<S, R>
where
    S: KeyValueStore + 'static,
    R: RemoteEndpoint + 'static,
{
    shared: Arc<Shared<S, R>>,
}

impl<S, R> Clone for OfflineSync<S, R>
where
    S: KeyValueStore + 'static,
    R: RemoteEndpoint + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<S, R>
where
    S: KeyValueStore + 'static,
    R: RemoteEndpoint + 'static,
{
    config: OfflineConfig,
    store: Arc<S>,
    gate: FeatureGate,
    monitor: ConnectivityMonitor,
    queue: Arc<ActionQueue<S>>,
    snapshots: SnapshotCache<S>,
    engine: SyncEngine<S, R>,
    retry: RetryScheduler,
    source: Arc<dyn SnapshotSource>,
    runtime: Handle,
    subscription: Mutex<Option<Subscription>>,
}

impl<S, R> OfflineSync<S, R>
where
    S: KeyValueStore + 'static,
    R: RemoteEndpoint + 'static,
{
    /// Load the persisted queue and build the offline layer.
    ///
    /// `source` is read whenever a snapshot is taken. `initial` is the
    /// connectivity reported by the platform at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn open<F>(
        config: OfflineConfig,
        store: Arc<S>,
        remote: Arc<R>,
        source: F,
        initial: ConnectivityState,
    ) -> Result<Self, ClientError>
    where
        F: SnapshotSource + 'static,
    {
        let queue =
            Arc::new(ActionQueue::open(Arc::clone(&store), config.storage.queue_key.clone()).await?);
        let snapshots = SnapshotCache::new(Arc::clone(&store), config.storage.snapshot_key.clone())
            .with_max_bytes(config.storage.max_snapshot_bytes);
        let engine = SyncEngine::new(Arc::clone(&queue), remote, config.sync.submit_timeout());

        tracing::info!(
            "Offline layer ready ({}, {} pending actions)",
            initial,
            queue.cached_len()
        );

        Ok(Self {
            shared: Arc::new(Shared {
                gate: config.feature_gate(),
                retry: RetryScheduler::new(config.retry.max_attempts),
                monitor: ConnectivityMonitor::new(initial),
                config,
                store,
                queue,
                snapshots,
                engine,
                source: Arc::new(source),
                runtime: Handle::current(),
                subscription: Mutex::new(None),
            }),
        })
    }

    /// React to connectivity transitions.
    ///
    /// Going offline cancels the running drain and any pending retry and
    /// refreshes the snapshot in the background; coming online starts a
    /// drain. Returns false if already started.
    pub fn start(&self) -> bool {
        let mut slot = self.shared.lock_subscription();
        if slot.is_some() {
            return false;
        }

        let weak = Arc::downgrade(&self.shared);
        *slot = Some(self.shared.monitor.on_transition(move |state| {
            if let Some(shared) = weak.upgrade() {
                shared.on_transition(state);
            }
        }));
        true
    }

    /// Stop reacting to transitions. Returns false if not started.
    pub fn stop(&self) -> bool {
        match self.shared.lock_subscription().take() {
            Some(subscription) => subscription.unsubscribe(),
            None => false,
        }
    }

    /// Feed a platform connectivity signal.
    pub fn signal(&self, signal: PlatformSignal) -> ConnectivityState {
        self.shared.monitor.signal(signal)
    }

    /// The connectivity monitor, for registering additional handlers.
    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.shared.monitor
    }

    /// Current connectivity.
    pub fn connectivity(&self) -> ConnectivityState {
        self.shared.monitor.state()
    }

    /// Check whether `feature` may run under the current connectivity.
    pub fn is_available(&self, feature: &str) -> bool {
        self.shared.gate.is_available(feature, self.connectivity())
    }

    /// Route a UI action through the feature gate.
    ///
    /// Returns [`Dispatch::Execute`] when the feature may run now. While
    /// online it is queued instead if earlier actions are still pending, so
    /// it never overtakes them. Unavailable features are queued, and a
    /// drain is requested when online.
    ///
    /// # Errors
    ///
    /// Returns an error if the action had to be queued and the store write
    /// failed. The queue is unchanged in that case.
    pub async fn dispatch(
        &self,
        feature: &str,
        action_type: &str,
        payload: Value,
    ) -> StorageResult<Dispatch> {
        let connectivity = self.connectivity();
        if self.shared.gate.is_available(feature, connectivity) {
            let behind_queue = connectivity.is_online()
                && (self.shared.engine.is_running() || !self.shared.queue.is_empty().await);
            if !behind_queue {
                return Ok(Dispatch::Execute);
            }
        }

        let action = self.enqueue(action_type, payload).await?;
        Ok(Dispatch::Queued(action))
    }

    /// Append an action to the queue.
    ///
    /// Requests a drain when online unless `sync.drain_on_enqueue` is off.
    pub async fn enqueue(&self, action_type: &str, payload: Value) -> StorageResult<PendingAction> {
        let action = self.shared.queue.enqueue(action_type, payload).await?;
        tracing::info!("Queued {} as {}", action.action_type, action.id);
        if self.shared.config.sync.drain_on_enqueue && self.connectivity().is_online() {
            self.shared.spawn_drain();
        }
        Ok(action)
    }

    /// The queue in FIFO order.
    pub async fn list_pending(&self) -> Vec<PendingAction> {
        self.shared.queue.list_pending().await
    }

    /// Drop one queued action on user request. Returns false if absent.
    pub async fn discard(&self, id: ActionId) -> StorageResult<bool> {
        let removed = self.shared.queue.remove(id).await?;
        if removed {
            tracing::info!("Discarded {}", id);
        }
        Ok(removed)
    }

    /// Drop every queued action. Destructive; only for explicit user requests.
    pub async fn clear_queue(&self) -> StorageResult<()> {
        self.shared.queue.clear().await
    }

    /// Drain the queue now.
    ///
    /// `None` if offline or a drain is already running.
    pub async fn drain(&self) -> Option<SyncSession> {
        self.shared.drain().await
    }

    /// Take and persist a fresh offline snapshot.
    pub async fn refresh_snapshot(&self) -> StorageResult<OfflineSnapshot> {
        self.shared
            .snapshots
            .refresh(self.shared.source.as_ref())
            .await
    }

    /// The persisted offline snapshot, if one is usable.
    pub async fn load_snapshot(&self) -> Option<OfflineSnapshot> {
        self.shared.snapshots.load().await
    }

    /// Delete the persisted offline snapshot.
    pub async fn clear_snapshot(&self) -> StorageResult<()> {
        self.shared.snapshots.clear().await
    }

    /// Free-form settings stored under the settings key.
    pub async fn load_settings(&self) -> Option<Value> {
        let key = &self.shared.config.storage.settings_key;
        let raw = match self.shared.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Could not read settings: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings under {}: {}", key, e);
                None
            }
        }
    }

    /// Replace the stored settings.
    pub async fn save_settings(&self, settings: &Value) -> StorageResult<()> {
        let raw = serde_json::to_string(settings).map_err(CodecError::Serialization)?;
        self.shared
            .store
            .set(&self.shared.config.storage.settings_key, &raw)
            .await
    }

    /// Current user-facing indicators.
    pub async fn indicators(&self) -> StatusIndicators {
        StatusIndicators {
            connectivity: self.connectivity(),
            pending_actions: self.shared.queue.len().await,
            drain_progress: self.shared.engine.progress(),
            last_failure: self
                .shared
                .engine
                .last_outcome()
                .and_then(|s| s.failure)
                .map(|reason| reason.to_string()),
        }
    }

    /// Dismiss the failure notification.
    pub fn dismiss_failure(&self) {
        self.shared.engine.dismiss_failure();
    }

    /// The live drain session.
    pub fn session(&self) -> SyncSession {
        self.shared.engine.session()
    }

    /// Watch drain progress.
    pub fn subscribe_progress(&self) -> watch::Receiver<SyncSession> {
        self.shared.engine.subscribe_progress()
    }

    /// Watch the queue length.
    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.shared.queue.subscribe_len()
    }

    /// Check if an automatic retry is waiting.
    pub fn retry_scheduled(&self) -> bool {
        self.shared.retry.is_scheduled()
    }
}

impl<S, R> Shared<S, R>
where
    S: KeyValueStore + 'static,
    R: RemoteEndpoint + 'static,
{
    fn lock_subscription(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn on_transition(self: &Arc<Self>, state: ConnectivityState) {
        let signal = match state {
            ConnectivityState::Online => PlatformSignal::BecameOnline,
            ConnectivityState::Offline => PlatformSignal::BecameOffline,
        };

        let (_, reactions) = react(signal);
        for reaction in reactions {
            match reaction {
                Reaction::Notify(_) => {}
                Reaction::CancelDrain => {
                    self.engine.cancel();
                }
                Reaction::CancelRetry => {
                    self.retry.cancel();
                }
                Reaction::RefreshSnapshot => self.spawn_refresh(),
                Reaction::RequestDrain => {
                    if !self.engine.resume() {
                        self.spawn_drain();
                    }
                }
            }
        }
    }

    fn spawn_refresh(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            if let Err(e) = shared.snapshots.refresh(shared.source.as_ref()).await {
                tracing::warn!("Offline snapshot refresh failed: {}", e);
            }
        });
    }

    fn spawn_drain(self: &Arc<Self>) {
        if self.engine.is_running() {
            return;
        }
        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            shared.drain().await;
        });
    }

    async fn drain(self: &Arc<Self>) -> Option<SyncSession> {
        let outcome = self.engine.drain(self.monitor.state()).await?;
        self.after_drain(&outcome);
        Some(outcome)
    }

    fn after_drain(self: &Arc<Self>, outcome: &SyncSession) {
        let online = self.monitor.state().is_online();
        match outcome.status {
            SyncStatus::Succeeded => {
                self.retry.reset();
                if online && self.queue.cached_len() > 0 {
                    tracing::debug!("Actions were queued during the drain, draining again");
                    self.spawn_drain();
                }
            }
            SyncStatus::Failed
                if online && outcome.failure == Some(FailureReason::WentOffline) =>
            {
                tracing::debug!("Back online before the drain stopped, draining again");
                self.spawn_drain();
            }
            SyncStatus::Failed if online && self.config.retry.enabled => {
                let weak = Arc::downgrade(self);
                self.retry.schedule(async move {
                    if let Some(shared) = weak.upgrade() {
                        shared.drain().await;
                    }
                });
            }
            _ => {}
        }
    }
}
