//! Drain state machine for offsync.
//!
//! This module provides a pure, side-effect-free state machine for one
//! drain cycle of the action queue. The state machine takes events as input
//! and produces a new state plus a list of actions to execute.
//!
//! ```text
//! Idle → Running → {Succeeded, Failed} → Idle
//! ```
//!
//! The actual I/O (submitting to the remote, removing from the queue) is
//! performed by sync-client, not by this module.

use offsync_types::ConnectivityState;
use std::fmt;

/// Lifecycle of a drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No drain in progress.
    Idle,
    /// Actions are being submitted.
    Running,
    /// Every action of the cycle was applied.
    Succeeded,
    /// The cycle stopped early; unconfirmed actions stay queued.
    Failed,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Why a drain stopped before applying every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The remote endpoint rejected or could not apply the action.
    Remote(String),
    /// The remote submission exceeded its deadline.
    Timeout,
    /// Confirming the action in local storage failed.
    Storage(String),
    /// Connectivity was lost mid-drain.
    WentOffline,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(msg) => write!(f, "remote error: {}", msg),
            Self::Timeout => write!(f, "remote submission timed out"),
            Self::Storage(msg) => write!(f, "storage error: {}", msg),
            Self::WentOffline => write!(f, "connectivity lost during drain"),
        }
    }
}

/// Progress of one drain cycle. NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSession {
    /// Queue length when the drain started.
    pub total_actions: usize,
    /// Actions confirmed by the remote and removed from the queue.
    pub completed_actions: usize,
    /// Current lifecycle state.
    pub status: SyncStatus,
    /// Set when `status` is [`SyncStatus::Failed`].
    pub failure: Option<FailureReason>,
    cancel_requested: bool,
}

impl SyncSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self {
            total_actions: 0,
            completed_actions: 0,
            status: SyncStatus::Idle,
            failure: None,
            cancel_requested: false,
        }
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: DrainEvent) -> (Self, Vec<DrainAction>) {
        match (self.status, event) {
            // Start (from any resting state, only while online)
            (
                SyncStatus::Idle | SyncStatus::Succeeded | SyncStatus::Failed,
                DrainEvent::DrainRequested {
                    connectivity: ConnectivityState::Online,
                    pending,
                },
            ) => {
                let started = DrainAction::Started { total: pending };
                if pending == 0 {
                    (
                        Self::finished(0, 0, SyncStatus::Succeeded, None),
                        vec![
                            started,
                            DrainAction::Finished {
                                status: SyncStatus::Succeeded,
                            },
                        ],
                    )
                } else {
                    (
                        Self {
                            total_actions: pending,
                            completed_actions: 0,
                            status: SyncStatus::Running,
                            failure: None,
                            cancel_requested: false,
                        },
                        vec![started, DrainAction::SubmitNext],
                    )
                }
            }

            // From Running
            (SyncStatus::Running, DrainEvent::Applied) => {
                let completed = self.completed_actions.saturating_add(1);
                let total = self.total_actions;
                let progress = DrainAction::ReportProgress { completed, total };

                if completed >= total {
                    (
                        Self::finished(total, completed, SyncStatus::Succeeded, None),
                        vec![
                            progress,
                            DrainAction::Finished {
                                status: SyncStatus::Succeeded,
                            },
                        ],
                    )
                } else if self.cancel_requested {
                    (
                        Self::finished(
                            total,
                            completed,
                            SyncStatus::Failed,
                            Some(FailureReason::WentOffline),
                        ),
                        vec![
                            progress,
                            DrainAction::Finished {
                                status: SyncStatus::Failed,
                            },
                        ],
                    )
                } else {
                    (
                        Self {
                            completed_actions: completed,
                            ..self
                        },
                        vec![progress, DrainAction::SubmitNext],
                    )
                }
            }
            (SyncStatus::Running, DrainEvent::SubmitFailed { reason }) => (
                Self::finished(
                    self.total_actions,
                    self.completed_actions,
                    SyncStatus::Failed,
                    Some(reason),
                ),
                vec![DrainAction::Finished {
                    status: SyncStatus::Failed,
                }],
            ),
            (SyncStatus::Running, DrainEvent::QueueExhausted) => (
                Self::finished(
                    self.total_actions,
                    self.completed_actions,
                    SyncStatus::Succeeded,
                    None,
                ),
                vec![DrainAction::Finished {
                    status: SyncStatus::Succeeded,
                }],
            ),
            (SyncStatus::Running, DrainEvent::ConnectivityLost) => (
                Self {
                    cancel_requested: true,
                    ..self
                },
                vec![],
            ),
            (SyncStatus::Running, DrainEvent::ConnectivityRestored) => (
                Self {
                    cancel_requested: false,
                    ..self
                },
                vec![],
            ),

            // Back to rest
            (SyncStatus::Succeeded | SyncStatus::Failed, DrainEvent::Reset) => (Self::new(), vec![]),

            // Duplicate triggers, offline requests, stray events - stay in current state
            (_, _) => (self, vec![]),
        }
    }

    fn finished(
        total: usize,
        completed: usize,
        status: SyncStatus,
        failure: Option<FailureReason>,
    ) -> Self {
        Self {
            total_actions: total,
            completed_actions: completed,
            status,
            failure,
            cancel_requested: false,
        }
    }

    /// Check if a drain is in flight.
    pub fn is_running(&self) -> bool {
        self.status == SyncStatus::Running
    }

    /// Check if connectivity was lost while running.
    ///
    /// No further action may be submitted once this is set.
    pub fn is_cancelling(&self) -> bool {
        self.cancel_requested
    }

    /// Drain progress as a percentage (100 for an empty drain).
    pub fn progress_percent(&self) -> u8 {
        if self.total_actions == 0 {
            return 100;
        }
        let pct = self.completed_actions.saturating_mul(100) / self.total_actions;
        pct.min(100) as u8
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur during a drain cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainEvent {
    /// A drain was triggered (connectivity transition or user request).
    DrainRequested {
        /// Connectivity at the time of the request.
        connectivity: ConnectivityState,
        /// Queue length at the time of the request.
        pending: usize,
    },
    /// The remote acknowledged the head action and it was removed locally.
    Applied,
    /// Submitting or confirming the head action failed.
    SubmitFailed {
        /// Why the drain stops.
        reason: FailureReason,
    },
    /// The queue ran empty before `total_actions` were applied
    /// (entries discarded by the user mid-drain).
    QueueExhausted,
    /// Connectivity flipped to offline mid-drain.
    ConnectivityLost,
    /// Connectivity came back before the in-flight submission finished.
    ConnectivityRestored,
    /// Return a finished session to idle.
    Reset,
}

/// Actions to be executed by the sync-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainAction {
    /// A drain cycle started.
    Started {
        /// Number of actions in this cycle.
        total: usize,
    },
    /// Submit the current queue head to the remote.
    SubmitNext,
    /// Publish progress to the application.
    ReportProgress {
        /// Actions applied so far.
        completed: usize,
        /// Actions in this cycle.
        total: usize,
    },
    /// The cycle reached a terminal state.
    Finished {
        /// `Succeeded` or `Failed`.
        status: SyncStatus,
    },
}
