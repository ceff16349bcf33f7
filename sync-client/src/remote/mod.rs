//! Remote sync endpoint abstraction for offsync.
//!
//! The remote system the queue drains into is a collaborator: it accepts
//! one action at a time and must be idempotent on the action id, so an
//! action resubmitted after an interrupted drain is not applied twice.
//!
//! # Example
//!
//! ```ignore
//! let remote = MockRemote::new();
//! remote.apply(&action).await?;
//! assert_eq!(remote.applied_ids(), vec![action.id]);
//! ```

mod mock;

pub use mock::MockRemote;

use async_trait::async_trait;
use offsync_types::PendingAction;

use crate::error::RemoteError;

/// Remote endpoint that applies queued actions.
///
/// Implementations handle the wire protocol (HTTP, mock, etc).
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    /// Apply one action remotely.
    ///
    /// `Ok(())` means the remote acknowledged the action. Resubmitting an
    /// already applied id must succeed without duplicating its effect.
    async fn apply(&self, action: &PendingAction) -> Result<(), RemoteError>;
}
