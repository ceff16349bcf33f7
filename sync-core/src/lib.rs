//! # sync-core
//!
//! Pure logic for offsync (no I/O, instant tests).
//!
//! This crate implements the state machines and algorithms of the offline
//! layer without any network or storage I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (key-value store, remote endpoint) is performed by
//! `sync-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod connectivity;
pub mod gate;
pub mod outbox;
pub mod session;

pub use backoff::retry_delay;
pub use connectivity::{react, Reaction};
pub use gate::{FeatureGate, DEFAULT_OFFLINE_FEATURES};
pub use outbox::{ActionLog, IdGenerator};
pub use session::{DrainAction, DrainEvent, FailureReason, SyncSession, SyncStatus};
