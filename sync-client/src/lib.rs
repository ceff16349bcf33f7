//! # sync-client
//!
//! Offline-first synchronization layer for offsync.
//!
//! This is the library applications embed to keep working while
//! disconnected and to reconcile with the remote once connectivity returns.
//!
//! ## Features
//!
//! - **Durable Outbox**: FIFO action queue persisted as one document per key
//! - **Offline Snapshot**: whole-value copy of browsable state
//! - **Sync Engine**: ordered drain that stops at the first failure
//! - **Pluggable Storage and Remote**: `KeyValueStore` and `RemoteEndpoint` traits
//! - **Pure State Machine**: Uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use offsync_client::{FileStore, OfflineConfig, OfflineSync};
//!
//! let store = Arc::new(FileStore::open("/var/lib/app/offsync").await?);
//! let sync = OfflineSync::open(OfflineConfig::default(), store, remote, source, initial).await?;
//! sync.start();
//!
//! // Platform reports connectivity
//! sync.signal(PlatformSignal::BecameOffline);
//! sync.dispatch("buy_pixel", "buy_pixel", payload).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod queue;
pub mod remote;
pub mod retry;
pub mod snapshot;
pub mod store;

pub use client::{Dispatch, OfflineSync, StatusIndicators};
pub use config::{GateConfig, OfflineConfig, RetryConfig, StorageConfig, SyncConfig};
pub use engine::SyncEngine;
pub use error::{ClientError, ConfigError, RemoteError, StorageError, StorageResult};
pub use monitor::{ConnectivityMonitor, Subscription};
pub use queue::ActionQueue;
pub use remote::{MockRemote, RemoteEndpoint};
pub use retry::RetryScheduler;
pub use snapshot::{SnapshotCache, SnapshotSource};
pub use store::{FileStore, KeyValueStore, MemoryStore};

pub use offsync_core::{FailureReason, FeatureGate, SyncSession, SyncStatus};
pub use offsync_types::{
    ActionId, ConnectivityState, OfflineSnapshot, PendingAction, PlatformSignal, StateSnapshot,
};
