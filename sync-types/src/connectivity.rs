//! Connectivity model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Last known network reachability.
///
/// Derived from platform signals and recomputed at startup; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectivityState {
    /// The remote system is reachable.
    Online,
    /// No connectivity; gated actions are queued.
    Offline,
}

impl ConnectivityState {
    /// Check if online.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Raw events reported by the platform ("became online" / "became offline").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSignal {
    /// The platform reported connectivity.
    BecameOnline,
    /// The platform reported loss of connectivity.
    BecameOffline,
}

impl PlatformSignal {
    /// The state this signal moves to.
    pub fn target_state(&self) -> ConnectivityState {
        match self {
            Self::BecameOnline => ConnectivityState::Online,
            Self::BecameOffline => ConnectivityState::Offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_map_to_states() {
        assert_eq!(
            PlatformSignal::BecameOnline.target_state(),
            ConnectivityState::Online
        );
        assert_eq!(
            PlatformSignal::BecameOffline.target_state(),
            ConnectivityState::Offline
        );
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(ConnectivityState::Online.to_string(), "online");
        assert_eq!(ConnectivityState::Offline.to_string(), "offline");
    }
}
