//! Sync engine - drains the action queue into the remote endpoint.
//!
//! The engine interprets the pure drain state machine from sync-core: it
//! feeds events into [`SyncSession::on_event`] and performs the I/O the
//! returned [`DrainAction`]s ask for.
//!
//! ```text
//! queue head → remote.apply (bounded by timeout) → queue.remove → Applied
//!                      ↓ error / timeout
//!                 SubmitFailed → Failed (rest stays queued)
//! ```

use offsync_core::{DrainAction, DrainEvent, FailureReason, SyncSession, SyncStatus};
use offsync_types::ConnectivityState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::error::RemoteError;
use crate::queue::ActionQueue;
use crate::remote::RemoteEndpoint;
use crate::store::KeyValueStore;

/// Reconciles the action queue with the remote endpoint.
pub struct SyncEngine<S: KeyValueStore, R: RemoteEndpoint> {
    queue: Arc<ActionQueue<S>>,
    remote: Arc<R>,
    session: Mutex<SyncSession>,
    last_outcome: Mutex<Option<SyncSession>>,
    progress_tx: watch::Sender<SyncSession>,
    submit_timeout: Duration,
}

impl<S: KeyValueStore, R: RemoteEndpoint> SyncEngine<S, R> {
    /// Create an idle engine.
    pub fn new(queue: Arc<ActionQueue<S>>, remote: Arc<R>, submit_timeout: Duration) -> Self {
        let (progress_tx, _) = watch::channel(SyncSession::new());
        Self {
            queue,
            remote,
            session: Mutex::new(SyncSession::new()),
            last_outcome: Mutex::new(None),
            progress_tx,
            submit_timeout,
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, SyncSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_outcome(&self) -> MutexGuard<'_, Option<SyncSession>> {
        self.last_outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one drain cycle.
    ///
    /// Returns `None` without doing anything when `connectivity` is offline
    /// or a drain is already running. Otherwise returns the finished
    /// session (`Succeeded` or `Failed`); the engine itself is back to
    /// `Idle` when this returns.
    pub async fn drain(&self, connectivity: ConnectivityState) -> Option<SyncSession> {
        let pending = self.queue.len().await;
        let mut actions = self.apply(DrainEvent::DrainRequested {
            connectivity,
            pending,
        });

        if actions.is_empty() {
            tracing::debug!("Drain not started ({}, {})", connectivity, self.session().status);
            return None;
        }

        loop {
            let mut submit = false;
            for action in actions {
                match action {
                    DrainAction::Started { total } => {
                        tracing::info!("Drain started: {} pending actions", total);
                    }
                    DrainAction::ReportProgress { completed, total } => {
                        tracing::debug!("Drain progress: {}/{}", completed, total);
                    }
                    DrainAction::SubmitNext => submit = true,
                    DrainAction::Finished { status } => return Some(self.finish(status)),
                }
            }

            if !submit {
                // Every event fed from this loop ends in SubmitNext or Finished.
                return Some(self.finish(self.session().status));
            }

            let event = self.submit_head().await;
            actions = self.apply(event);
        }
    }

    /// Submit the queue head and confirm it locally.
    async fn submit_head(&self) -> DrainEvent {
        let Some(action) = self.queue.head().await else {
            tracing::debug!("Queue ran empty before drain total was reached");
            return DrainEvent::QueueExhausted;
        };

        let reason = match tokio::time::timeout(self.submit_timeout, self.remote.apply(&action)).await
        {
            Ok(Ok(())) => match self.queue.remove(action.id).await {
                Ok(_) => return DrainEvent::Applied,
                Err(e) => {
                    tracing::warn!("Applied {} remotely but could not dequeue it: {}", action.id, e);
                    FailureReason::Storage(e.to_string())
                }
            },
            Ok(Err(RemoteError::Timeout)) | Err(_) => {
                tracing::warn!(
                    "Submission of {} ({}) timed out after {:?}",
                    action.id,
                    action.action_type,
                    self.submit_timeout
                );
                FailureReason::Timeout
            }
            Ok(Err(e)) => {
                tracing::warn!("Submission of {} ({}) failed: {}", action.id, action.action_type, e);
                FailureReason::Remote(e.to_string())
            }
        };
        DrainEvent::SubmitFailed { reason }
    }

    /// Feed one event into the session and publish the result.
    fn apply(&self, event: DrainEvent) -> Vec<DrainAction> {
        let mut session = self.lock_session();
        let (next, actions) = session.clone().on_event(event);
        *session = next.clone();
        self.publish(next);
        actions
    }

    fn publish(&self, session: SyncSession) {
        self.progress_tx.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
    }

    /// Record the finished cycle and return the engine to idle.
    fn finish(&self, status: SyncStatus) -> SyncSession {
        let outcome = {
            let mut session = self.lock_session();
            let outcome = session.clone();
            let (idle, _) = outcome.clone().on_event(DrainEvent::Reset);
            *session = idle;
            outcome
        };

        match &outcome.failure {
            Some(reason) => tracing::warn!(
                "Drain {} after {}/{} actions: {}",
                status,
                outcome.completed_actions,
                outcome.total_actions,
                reason
            ),
            None => tracing::info!(
                "Drain {}: {}/{} actions applied",
                status,
                outcome.completed_actions,
                outcome.total_actions
            ),
        }

        *self.lock_outcome() = Some(outcome.clone());
        self.publish(outcome.clone());
        outcome
    }

    /// Stop the running drain after its in-flight submission.
    ///
    /// Returns true if a drain was running.
    pub fn cancel(&self) -> bool {
        let running = self.is_running();
        if running {
            tracing::info!("Cancelling drain after in-flight submission");
            self.apply(DrainEvent::ConnectivityLost);
        }
        running
    }

    /// Undo a [`cancel`](Self::cancel) whose in-flight submission is still
    /// pending, so the drain carries on.
    ///
    /// Returns true if a drain was running.
    pub fn resume(&self) -> bool {
        let mut session = self.lock_session();
        if !session.is_running() {
            return false;
        }
        if session.is_cancelling() {
            tracing::info!("Connectivity restored, drain continues");
        }
        let (next, _) = session.clone().on_event(DrainEvent::ConnectivityRestored);
        *session = next.clone();
        drop(session);
        self.publish(next);
        true
    }

    /// The live session (`Idle` between drains).
    pub fn session(&self) -> SyncSession {
        self.lock_session().clone()
    }

    /// Check if a drain is in flight.
    pub fn is_running(&self) -> bool {
        self.lock_session().is_running()
    }

    /// Progress percentage of the running drain, if any.
    pub fn progress(&self) -> Option<u8> {
        let session = self.lock_session();
        session.is_running().then(|| session.progress_percent())
    }

    /// The outcome of the most recent drain cycle.
    pub fn last_outcome(&self) -> Option<SyncSession> {
        self.lock_outcome().clone()
    }

    /// Forget the last failure (the user dismissed the notification).
    pub fn dismiss_failure(&self) {
        let mut outcome = self.lock_outcome();
        if outcome.as_ref().is_some_and(|s| s.status == SyncStatus::Failed) {
            *outcome = None;
        }
    }

    /// Watch the session: live while running, then the finished outcome.
    pub fn subscribe_progress(&self) -> watch::Receiver<SyncSession> {
        self.progress_tx.subscribe()
    }
}
