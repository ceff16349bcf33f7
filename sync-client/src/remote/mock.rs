//! Mock remote endpoint for testing.
//!
//! Records submissions, de-duplicates effects by action id and allows
//! forcing failures or hangs on specific actions.

use super::RemoteEndpoint;
use crate::error::RemoteError;
use async_trait::async_trait;
use offsync_types::{ActionId, PendingAction};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SubmitHook = Arc<dyn Fn(&PendingAction) + Send + Sync>;

/// Idempotent in-memory remote.
#[derive(Clone, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Default)]
struct MockRemoteInner {
    submissions: Vec<ActionId>,
    applied: Vec<PendingAction>,
    applied_ids: HashSet<ActionId>,
    fail_next: Option<String>,
    fail_on: HashMap<ActionId, String>,
    hang_on: HashSet<ActionId>,
    on_submit: Option<SubmitHook>,
}

enum Outcome {
    Applied,
    Failed(String),
    Hang,
}

impl MockRemote {
    /// Create a remote that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockRemoteInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ids of every submission, including duplicates, in arrival order.
    pub fn submissions(&self) -> Vec<ActionId> {
        self.lock().submissions.clone()
    }

    /// Ids whose effect was applied, once each, in application order.
    pub fn applied_ids(&self) -> Vec<ActionId> {
        self.lock().applied.iter().map(|a| a.id).collect()
    }

    /// Action types whose effect was applied, in application order.
    pub fn applied_types(&self) -> Vec<String> {
        self.lock()
            .applied
            .iter()
            .map(|a| a.action_type.clone())
            .collect()
    }

    /// Cause the next submission to be rejected.
    pub fn fail_next(&self, error: &str) {
        self.lock().fail_next = Some(error.to_string());
    }

    /// Reject every submission of `id`.
    pub fn fail_on(&self, id: ActionId, error: &str) {
        self.lock().fail_on.insert(id, error.to_string());
    }

    /// Never answer submissions of `id` (simulates a stalled request).
    pub fn hang_on(&self, id: ActionId) {
        self.lock().hang_on.insert(id);
    }

    /// Accept `id` normally again.
    pub fn heal(&self, id: ActionId) {
        let mut inner = self.lock();
        inner.fail_on.remove(&id);
        inner.hang_on.remove(&id);
    }

    /// Run `hook` while each submission is in flight.
    pub fn on_submit<F>(&self, hook: F)
    where
        F: Fn(&PendingAction) + Send + Sync + 'static,
    {
        self.lock().on_submit = Some(Arc::new(hook));
    }

    /// Forget all recorded submissions and injected behavior.
    pub fn reset(&self) {
        *self.lock() = MockRemoteInner::default();
    }
}

impl fmt::Debug for MockRemote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("MockRemote")
            .field("submissions", &inner.submissions.len())
            .field("applied", &inner.applied.len())
            .finish()
    }
}

#[async_trait]
impl RemoteEndpoint for MockRemote {
    async fn apply(&self, action: &PendingAction) -> Result<(), RemoteError> {
        let (outcome, hook) = {
            let mut inner = self.lock();
            inner.submissions.push(action.id);

            let outcome = if let Some(error) = inner.fail_next.take() {
                Outcome::Failed(error)
            } else if let Some(error) = inner.fail_on.get(&action.id) {
                Outcome::Failed(error.clone())
            } else if inner.hang_on.contains(&action.id) {
                Outcome::Hang
            } else {
                if inner.applied_ids.insert(action.id) {
                    inner.applied.push(action.clone());
                }
                Outcome::Applied
            };
            (outcome, inner.on_submit.clone())
        };

        if let Some(hook) = hook {
            hook(action);
        }

        match outcome {
            Outcome::Applied => Ok(()),
            Outcome::Failed(error) => Err(RemoteError::Rejected(error)),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn action(id: u64) -> PendingAction {
        PendingAction::new(ActionId::new(id), "buy_pixel", json!({ "id": id }), id)
    }

    #[tokio::test]
    async fn applies_and_records() {
        let remote = MockRemote::new();

        remote.apply(&action(1)).await.unwrap();
        remote.apply(&action(2)).await.unwrap();

        assert_eq!(remote.applied_ids(), vec![ActionId::new(1), ActionId::new(2)]);
        assert_eq!(remote.submissions().len(), 2);
    }

    #[tokio::test]
    async fn resubmission_is_idempotent() {
        let remote = MockRemote::new();

        remote.apply(&action(1)).await.unwrap();
        remote.apply(&action(1)).await.unwrap();

        assert_eq!(remote.applied_ids(), vec![ActionId::new(1)]);
        assert_eq!(remote.submissions().len(), 2);
    }

    #[tokio::test]
    async fn forced_failure_only_once() {
        let remote = MockRemote::new();
        remote.fail_next("503");

        assert!(matches!(
            remote.apply(&action(1)).await,
            Err(RemoteError::Rejected(_))
        ));
        remote.apply(&action(1)).await.unwrap();
        assert_eq!(remote.applied_ids(), vec![ActionId::new(1)]);
    }

    #[tokio::test]
    async fn fail_on_is_sticky_until_healed() {
        let remote = MockRemote::new();
        remote.fail_on(ActionId::new(2), "conflict");

        assert!(remote.apply(&action(2)).await.is_err());
        assert!(remote.apply(&action(2)).await.is_err());

        remote.heal(ActionId::new(2));
        assert!(remote.apply(&action(2)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn hang_never_completes() {
        let remote = MockRemote::new();
        remote.hang_on(ActionId::new(1));

        let result = tokio::time::timeout(Duration::from_secs(60), remote.apply(&action(1))).await;

        assert!(result.is_err());
        assert!(remote.applied_ids().is_empty());
    }

    #[tokio::test]
    async fn hook_runs_per_submission() {
        let remote = MockRemote::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        remote.on_submit(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        remote.apply(&action(1)).await.unwrap();
        remote.apply(&action(2)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reset_clears_all() {
        let remote = MockRemote::new();
        remote.apply(&action(1)).await.unwrap();
        remote.fail_next("x");

        remote.reset();

        assert!(remote.submissions().is_empty());
        remote.apply(&action(2)).await.unwrap();
    }
}
