//! Feature availability by connectivity.
//!
//! A pure lookup consulted before attempting an action: features on the
//! offline allowlist are always available, everything else only while online.

use offsync_types::ConnectivityState;
use std::collections::BTreeSet;

/// Features usable while offline when no allowlist is configured.
pub const DEFAULT_OFFLINE_FEATURES: &[&str] = &[
    "browse_collection",
    "view_item",
    "view_profile",
    "view_achievements",
    "view_offline_snapshot",
];

/// Fixed allowlist of features that work without connectivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGate {
    offline_allowed: BTreeSet<String>,
}

impl FeatureGate {
    /// Create a gate from an explicit offline allowlist.
    pub fn new<I, S>(offline_allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            offline_allowed: offline_allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether `feature` may run now.
    ///
    /// Deterministic: the answer depends only on the arguments and the
    /// allowlist fixed at construction.
    pub fn is_available(&self, feature: &str, connectivity: ConnectivityState) -> bool {
        match connectivity {
            ConnectivityState::Online => true,
            ConnectivityState::Offline => self.offline_allowed.contains(feature),
        }
    }

    /// Check whether `feature` works without connectivity.
    pub fn works_offline(&self, feature: &str) -> bool {
        self.offline_allowed.contains(feature)
    }

    /// The offline allowlist, sorted.
    pub fn offline_features(&self) -> impl Iterator<Item = &str> {
        self.offline_allowed.iter().map(String::as_str)
    }
}

impl Default for FeatureGate {
    fn default() -> Self {
        Self::new(DEFAULT_OFFLINE_FEATURES.iter().copied())
    }
}
