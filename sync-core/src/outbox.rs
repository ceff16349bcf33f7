//! Outbox list semantics for offsync.
//!
//! This module provides the in-memory model of the action queue:
//! - FIFO ordering of pending actions
//! - Removal by id (idempotent: removing an absent id is a no-op)
//! - Monotonic id assignment that survives restarts
//!
//! Persistence is done by sync-client, which rewrites the whole list after
//! every mutation. Callers mutate a clone and only adopt it once the write
//! succeeded, so a failed write never leaves a half-updated list.

use offsync_types::{ActionId, PendingAction};
use serde_json::Value;

/// Assigns strictly increasing, timestamp-based action ids.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: Option<ActionId>,
}

impl IdGenerator {
    /// Create a generator with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that continues after the largest id in `actions`.
    ///
    /// Use this when resuming from a persisted queue.
    pub fn seeded(actions: &[PendingAction]) -> Self {
        Self {
            last: actions.iter().map(|a| a.id).max(),
        }
    }

    /// Assign the next id for an action enqueued at `now_ms`.
    ///
    /// Uses the timestamp when it is ahead of the last id, otherwise the
    /// last id plus one (same millisecond, or the clock went backwards).
    pub fn next(&mut self, now_ms: u64) -> ActionId {
        let candidate = ActionId::new(now_ms);
        let id = match self.last {
            Some(last) if candidate <= last => last.next(),
            _ => candidate,
        };
        self.last = Some(id);
        id
    }

    /// The most recently assigned id.
    pub fn last(&self) -> Option<ActionId> {
        self.last
    }
}

/// Ordered list of pending actions.
///
/// Actions flow through the log in this order:
/// 1. `append()` - add to the tail
/// 2. `head()` - inspect the oldest action for submission
/// 3. `remove()` - drop an action once the remote confirmed it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLog {
    actions: Vec<PendingAction>,
}

impl ActionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a log from its persisted order.
    pub fn from_actions(actions: Vec<PendingAction>) -> Self {
        Self { actions }
    }

    /// Build and append a new action, returning a copy of it.
    pub fn append(
        &mut self,
        ids: &mut IdGenerator,
        action_type: &str,
        payload: Value,
        now_ms: u64,
    ) -> PendingAction {
        let action = PendingAction::new(ids.next(now_ms), action_type, payload, now_ms);
        self.actions.push(action.clone());
        action
    }

    /// Remove the action with the given id.
    ///
    /// Returns `false` (and leaves the log untouched) if it is absent.
    pub fn remove(&mut self, id: ActionId) -> bool {
        match self.actions.iter().position(|a| a.id == id) {
            Some(index) => {
                self.actions.remove(index);
                true
            }
            None => false,
        }
    }

    /// The oldest pending action.
    pub fn head(&self) -> Option<&PendingAction> {
        self.actions.first()
    }

    /// Check if an action with this id is queued.
    pub fn contains(&self, id: ActionId) -> bool {
        self.actions.iter().any(|a| a.id == id)
    }

    /// All actions in FIFO order.
    pub fn as_slice(&self) -> &[PendingAction] {
        &self.actions
    }

    /// Number of queued actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Remove every action.
    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log_with(kinds: &[&str]) -> (ActionLog, IdGenerator) {
        let mut log = ActionLog::new();
        let mut ids = IdGenerator::new();
        for (i, kind) in kinds.iter().enumerate() {
            log.append(&mut ids, kind, json!({ "n": i }), 1_000 + i as u64);
        }
        (log, ids)
    }

    fn kinds(log: &ActionLog) -> Vec<&str> {
        log.as_slice().iter().map(|a| a.action_type.as_str()).collect()
    }

    // ===========================================
    // IdGenerator Tests
    // ===========================================

    #[test]
    fn ids_follow_the_clock() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next(1_000).value(), 1_000);
        assert_eq!(ids.next(1_500).value(), 1_500);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut ids = IdGenerator::new();
        let a = ids.next(1_000);
        let b = ids.next(1_000);
        let c = ids.next(1_000);
        assert!(a < b && b < c);
    }

    #[test]
    fn ids_stay_monotonic_when_clock_goes_backwards() {
        let mut ids = IdGenerator::new();
        let a = ids.next(5_000);
        let b = ids.next(4_000);
        assert!(b > a);
    }

    #[test]
    fn seeded_generator_continues_after_persisted_ids() {
        let (log, _) = log_with(&["a", "b"]);
        let newest = log.as_slice()[1].id;

        let mut ids = IdGenerator::seeded(log.as_slice());

        assert_eq!(ids.last(), Some(newest));
        assert!(ids.next(0) > newest);
    }

    // ===========================================
    // ActionLog Tests
    // ===========================================

    #[test]
    fn append_preserves_fifo_order() {
        let (log, _) = log_with(&["a", "b", "c"]);
        assert_eq!(kinds(&log), vec!["a", "b", "c"]);
        assert_eq!(log.head().map(|a| a.action_type.as_str()), Some("a"));
    }

    #[test]
    fn append_returns_the_stored_record() {
        let mut log = ActionLog::new();
        let mut ids = IdGenerator::new();

        let action = log.append(&mut ids, "buy_pixel", json!({ "x": 3 }), 42);

        assert_eq!(log.as_slice(), &[action.clone()]);
        assert_eq!(action.created_at, 42);
        assert_eq!(action.payload, json!({ "x": 3 }));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let (mut log, _) = log_with(&["a", "b", "c"]);
        let middle = log.as_slice()[1].id;

        assert!(log.remove(middle));

        assert_eq!(kinds(&log), vec!["a", "c"]);
        assert!(!log.contains(middle));
    }

    #[test]
    fn remove_absent_is_no_op() {
        let (mut log, _) = log_with(&["a"]);
        let before = log.clone();

        assert!(!log.remove(ActionId::new(999_999)));
        assert_eq!(log, before);
    }

    #[test]
    fn remove_twice_is_no_op() {
        let (mut log, _) = log_with(&["a", "b"]);
        let first = log.as_slice()[0].id;

        assert!(log.remove(first));
        assert!(!log.remove(first));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn clear_removes_all() {
        let (mut log, _) = log_with(&["a", "b"]);
        log.clear();
        assert!(log.is_empty());
        assert!(log.head().is_none());
    }

    #[test]
    fn failed_write_leaves_original_untouched() {
        let (log, mut ids) = log_with(&["a"]);

        // Callers mutate a copy and drop it when persisting fails
        let mut candidate = log.clone();
        candidate.append(&mut ids, "b", json!(null), 2_000);
        drop(candidate);

        assert_eq!(kinds(&log), vec!["a"]);
    }
}
