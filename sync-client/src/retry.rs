//! Delayed drain retries.
//!
//! After a failed drain the client may schedule one delayed re-attempt as a
//! cancellable tokio task. At most one retry is pending at a time, and the
//! retried work goes through the same drain entry point as every other
//! trigger, so the `Running` guard still bounds drains in flight to one.

use offsync_core::retry_delay;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Schedules delayed retries with exponential backoff.
#[derive(Debug)]
pub struct RetryScheduler {
    max_attempts: u32,
    state: Arc<Mutex<RetryState>>,
}

#[derive(Debug, Default)]
struct RetryState {
    attempts: u32,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

fn lock(state: &Mutex<RetryState>) -> MutexGuard<'_, RetryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RetryScheduler {
    /// Create a scheduler allowing `max_attempts` consecutive retries.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            state: Arc::new(Mutex::new(RetryState::default())),
        }
    }

    /// Run `job` after the backoff delay for the next attempt.
    ///
    /// Replaces any retry still waiting. Returns the delay, or `None` once
    /// `max_attempts` consecutive retries were used up.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, job: F) -> Option<Duration>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut state = lock(&self.state);
        if state.attempts >= self.max_attempts {
            tracing::warn!("Giving up automatic drain retries after {} attempts", state.attempts);
            return None;
        }

        state.attempts += 1;
        state.generation += 1;
        let attempt = state.attempts;
        let generation = state.generation;
        let delay = retry_delay(attempt);

        if let Some(previous) = state.pending.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.state);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                // Detach before running so the job may schedule the next retry.
                let mut state = lock(&shared);
                if state.generation == generation {
                    state.pending = None;
                }
            }
            tracing::debug!("Running drain retry {}", attempt);
            job.await;
        }));

        tracing::info!(
            "Drain retry {}/{} scheduled in {:?}",
            attempt,
            self.max_attempts,
            delay
        );
        Some(delay)
    }

    /// Abort the waiting retry, if any. Returns true if one was aborted.
    pub fn cancel(&self) -> bool {
        match lock(&self.state).pending.take() {
            Some(task) => {
                task.abort();
                tracing::debug!("Pending drain retry cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel and restart the attempt count (after a successful drain).
    pub fn reset(&self) {
        self.cancel();
        lock(&self.state).attempts = 0;
    }

    /// Retries scheduled since the last reset.
    pub fn attempts(&self) -> u32 {
        lock(&self.state).attempts
    }

    /// Check if a retry is waiting to run.
    pub fn is_scheduled(&self) -> bool {
        lock(&self.state).pending.is_some()
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.state).pending.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn job(runs: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let runs = Arc::clone(runs);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn job_runs_after_delay() {
        let scheduler = RetryScheduler::new(3);
        let runs = Arc::new(AtomicUsize::new(0));

        let delay = scheduler.schedule(job(&runs)).unwrap();
        assert!(delay >= Duration::from_secs(2));
        assert!(scheduler.is_scheduled());

        tokio::time::sleep(delay / 2).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(delay).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_run() {
        let scheduler = RetryScheduler::new(3);
        let runs = Arc::new(AtomicUsize::new(0));

        let delay = scheduler.schedule(job(&runs)).unwrap();
        assert!(scheduler.cancel());
        tokio::time::sleep(delay * 2).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!scheduler.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_retry() {
        let scheduler = RetryScheduler::new(3);
        let runs = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(job(&runs)).unwrap();
        let delay = scheduler.schedule(job(&runs)).unwrap();
        tokio::time::sleep(delay * 2).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_max_attempts() {
        let scheduler = RetryScheduler::new(2);
        let runs = Arc::new(AtomicUsize::new(0));

        assert!(scheduler.schedule(job(&runs)).is_some());
        assert!(scheduler.schedule(job(&runs)).is_some());
        assert!(scheduler.schedule(job(&runs)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_budget() {
        let scheduler = RetryScheduler::new(1);
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.schedule(job(&runs)).unwrap();

        scheduler.reset();

        assert_eq!(scheduler.attempts(), 0);
        assert!(!scheduler.is_scheduled());
        assert!(scheduler.schedule(job(&runs)).is_some());
    }
}
