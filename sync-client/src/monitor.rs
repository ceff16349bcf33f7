//! Connectivity monitor.
//!
//! Holds the last known [`ConnectivityState`] and fans platform signals out
//! to transition handlers. Signals are not de-duplicated: the platform
//! reporting "online" twice invokes every handler twice.

use offsync_types::{ConnectivityState, PlatformSignal};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Handler = Arc<dyn Fn(ConnectivityState) + Send + Sync>;

/// Current connectivity plus transition subscribers.
pub struct ConnectivityMonitor {
    inner: Arc<Mutex<MonitorInner>>,
}

struct MonitorInner {
    state: ConnectivityState,
    handlers: Vec<(u64, Handler)>,
    next_id: u64,
}

fn lock(inner: &Mutex<MonitorInner>) -> MutexGuard<'_, MonitorInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConnectivityMonitor {
    /// Create a monitor starting in `initial`.
    pub fn new(initial: ConnectivityState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorInner {
                state: initial,
                handlers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// The last known state.
    pub fn state(&self) -> ConnectivityState {
        lock(&self.inner).state
    }

    /// Record a platform signal and notify every handler.
    ///
    /// Handlers run synchronously on the caller's thread, outside the
    /// monitor's lock, so they may call back into the monitor.
    pub fn signal(&self, signal: PlatformSignal) -> ConnectivityState {
        let state = signal.target_state();
        let handlers: Vec<Handler> = {
            let mut inner = lock(&self.inner);
            inner.state = state;
            inner.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };

        tracing::info!("Connectivity changed: {}", state);
        for handler in handlers {
            handler(state);
        }
        state
    }

    /// Register `handler`, invoked once per observed transition with the
    /// new state.
    pub fn on_transition<F>(&self, handler: F) -> Subscription
    where
        F: Fn(ConnectivityState) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, Arc::new(handler)));
        Subscription {
            id,
            monitor: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        lock(&self.inner).handlers.len()
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("ConnectivityMonitor")
            .field("state", &inner.state)
            .field("handlers", &inner.handlers.len())
            .finish()
    }
}

/// Handle returned by [`ConnectivityMonitor::on_transition`].
///
/// Dropping it keeps the handler registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    monitor: Weak<Mutex<MonitorInner>>,
}

impl Subscription {
    /// Remove the handler. Returns false if the monitor is gone.
    pub fn unsubscribe(self) -> bool {
        match self.monitor.upgrade() {
            Some(inner) => {
                let mut inner = lock(&inner);
                let before = inner.handlers.len();
                inner.handlers.retain(|(id, _)| *id != self.id);
                inner.handlers.len() != before
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(monitor: &ConnectivityMonitor) -> (Arc<Mutex<Vec<ConnectivityState>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = monitor.on_transition(move |state| sink.lock().unwrap().push(state));
        (seen, sub)
    }

    #[test]
    fn reports_initial_state() {
        let monitor = ConnectivityMonitor::new(ConnectivityState::Offline);
        assert_eq!(monitor.state(), ConnectivityState::Offline);
    }

    #[test]
    fn signal_updates_state_and_notifies() {
        let monitor = ConnectivityMonitor::new(ConnectivityState::Online);
        let (seen, _sub) = recorder(&monitor);

        monitor.signal(PlatformSignal::BecameOffline);

        assert_eq!(monitor.state(), ConnectivityState::Offline);
        assert_eq!(*seen.lock().unwrap(), vec![ConnectivityState::Offline]);
    }

    #[test]
    fn repeated_signal_fires_twice() {
        let monitor = ConnectivityMonitor::new(ConnectivityState::Offline);
        let (seen, _sub) = recorder(&monitor);

        monitor.signal(PlatformSignal::BecameOnline);
        monitor.signal(PlatformSignal::BecameOnline);

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let monitor = ConnectivityMonitor::new(ConnectivityState::Online);
        let (seen, sub) = recorder(&monitor);
        let (other, _keep) = recorder(&monitor);

        assert!(sub.unsubscribe());
        monitor.signal(PlatformSignal::BecameOffline);

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(other.lock().unwrap().len(), 1);
        assert_eq!(monitor.handler_count(), 1);
    }

    #[test]
    fn unsubscribe_after_monitor_dropped() {
        let monitor = ConnectivityMonitor::new(ConnectivityState::Online);
        let (_seen, sub) = recorder(&monitor);
        drop(monitor);

        assert!(!sub.unsubscribe());
    }

    #[test]
    fn handler_may_read_state() {
        let monitor = Arc::new(ConnectivityMonitor::new(ConnectivityState::Offline));
        let observed = Arc::new(Mutex::new(None));
        let (m, sink) = (Arc::downgrade(&monitor), Arc::clone(&observed));
        let _sub = monitor.on_transition(move |_| {
            if let Some(m) = m.upgrade() {
                *sink.lock().unwrap() = Some(m.state());
            }
        });

        monitor.signal(PlatformSignal::BecameOnline);

        assert_eq!(*observed.lock().unwrap(), Some(ConnectivityState::Online));
    }
}
