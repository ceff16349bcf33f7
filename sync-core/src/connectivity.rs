//! Connectivity transition reactions.
//!
//! Maps a platform signal to the new [`ConnectivityState`] and the work the
//! client must schedule in response. There is no de-duplication: the same
//! signal twice produces the same reactions twice, and downstream consumers
//! (the drain guard) absorb the repeats.

use offsync_types::{ConnectivityState, PlatformSignal};

/// Work triggered by a connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Invoke transition subscribers with the new state.
    Notify(ConnectivityState),
    /// Refresh the offline snapshot (fire-and-forget).
    RefreshSnapshot,
    /// Stop an in-flight drain after its current submission.
    CancelDrain,
    /// Drop any scheduled drain retry.
    CancelRetry,
    /// Start a drain unless one is already running.
    RequestDrain,
}

/// Compute the new state and reactions for a platform signal.
pub fn react(signal: PlatformSignal) -> (ConnectivityState, Vec<Reaction>) {
    let state = signal.target_state();
    let reactions = match signal {
        PlatformSignal::BecameOffline => vec![
            Reaction::Notify(state),
            Reaction::CancelDrain,
            Reaction::CancelRetry,
            Reaction::RefreshSnapshot,
        ],
        PlatformSignal::BecameOnline => vec![Reaction::Notify(state), Reaction::RequestDrain],
    };
    (state, reactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn going_offline_refreshes_snapshot() {
        let (state, reactions) = react(PlatformSignal::BecameOffline);

        assert_eq!(state, ConnectivityState::Offline);
        assert!(reactions.contains(&Reaction::RefreshSnapshot));
        assert!(reactions.contains(&Reaction::CancelDrain));
        assert!(!reactions.contains(&Reaction::RequestDrain));
    }

    #[test]
    fn going_online_requests_drain() {
        let (state, reactions) = react(PlatformSignal::BecameOnline);

        assert_eq!(state, ConnectivityState::Online);
        assert!(reactions.contains(&Reaction::RequestDrain));
        assert!(!reactions.contains(&Reaction::RefreshSnapshot));
    }

    #[test]
    fn subscribers_are_notified_first() {
        for signal in [PlatformSignal::BecameOnline, PlatformSignal::BecameOffline] {
            let (state, reactions) = react(signal);
            assert_eq!(reactions.first(), Some(&Reaction::Notify(state)));
        }
    }

    #[test]
    fn repeated_signals_repeat_reactions() {
        let first = react(PlatformSignal::BecameOnline);
        let second = react(PlatformSignal::BecameOnline);
        assert_eq!(first, second);
    }
}
