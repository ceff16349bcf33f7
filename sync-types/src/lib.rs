//! # sync-types
//!
//! Data model for the offsync offline-first synchronization layer.
//!
//! This crate provides the foundational types used across all offsync crates:
//! - [`ActionId`] - Ordering and de-duplication key for queued actions
//! - [`PendingAction`] - A mutation recorded while offline (outbox entry)
//! - [`StateSnapshot`], [`OfflineSnapshot`] - Browsable-while-offline state
//! - [`ConnectivityState`], [`PlatformSignal`] - Connectivity model
//! - [`CodecError`] - Serialization errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod action;
mod connectivity;
mod error;
mod ids;
mod snapshot;

pub use action::{decode_queue, encode_queue, PendingAction};
pub use connectivity::{ConnectivityState, PlatformSignal};
pub use error::CodecError;
pub use ids::{unix_millis, ActionId};
pub use snapshot::{OfflineSnapshot, StateSnapshot};
