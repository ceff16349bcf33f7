//! Offline snapshots of viewable state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CodecError;

/// Viewable application state as handed over by the UI-facing store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Domain records valid for read-only browsing, in display order.
    pub items: Vec<Value>,
    /// Opaque profile projection.
    pub user_profile: Value,
    /// Opaque unlocked rewards.
    pub achievements: Vec<Value>,
}

impl StateSnapshot {
    /// Size in bytes of this state's serialized form.
    pub fn encoded_len(&self) -> Result<u64, CodecError> {
        serde_json::to_vec(self)
            .map(|bytes| bytes.len() as u64)
            .map_err(CodecError::Serialization)
    }
}

/// A complete, point-in-time copy of [`StateSnapshot`] kept for offline viewing.
///
/// Always replaced as a whole; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSnapshot {
    /// Domain records valid for read-only browsing, in display order.
    pub items: Vec<Value>,
    /// Opaque profile projection.
    pub user_profile: Value,
    /// Opaque unlocked rewards.
    pub achievements: Vec<Value>,
    /// When this snapshot was taken (unix milliseconds).
    pub last_synced_at: u64,
    /// Serialized size of the captured state, for storage-budget reporting.
    pub size_bytes: u64,
}

impl OfflineSnapshot {
    /// Capture `state` at `taken_at`, computing its serialized size.
    pub fn capture(state: StateSnapshot, taken_at: u64) -> Result<Self, CodecError> {
        let size_bytes = state.encoded_len()?;
        Ok(Self {
            items: state.items,
            user_profile: state.user_profile,
            achievements: state.achievements,
            last_synced_at: taken_at,
            size_bytes,
        })
    }

    /// Project back to the captured state.
    pub fn state(&self) -> StateSnapshot {
        StateSnapshot {
            items: self.items.clone(),
            user_profile: self.user_profile.clone(),
            achievements: self.achievements.clone(),
        }
    }

    /// Serialize to the persisted JSON document.
    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Serialization)
    }

    /// Parse a persisted JSON document.
    pub fn from_json(raw: &str) -> Result<Self, CodecError> {
        serde_json::from_str(raw).map_err(CodecError::Deserialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> StateSnapshot {
        StateSnapshot {
            items: vec![json!({ "id": "px-1", "price": 40 }), json!({ "id": "px-2" })],
            user_profile: json!({ "name": "sam", "credits": 120 }),
            achievements: vec![json!("first_purchase")],
        }
    }

    #[test]
    fn capture_records_size_and_time() {
        let state = sample_state();
        let expected = serde_json::to_vec(&state).unwrap().len() as u64;

        let snapshot = OfflineSnapshot::capture(state, 1_705_000_000_000).unwrap();

        assert_eq!(snapshot.size_bytes, expected);
        assert_eq!(snapshot.last_synced_at, 1_705_000_000_000);
    }

    #[test]
    fn state_projection_matches_capture() {
        let state = sample_state();
        let snapshot = OfflineSnapshot::capture(state.clone(), 1).unwrap();
        assert_eq!(snapshot.state(), state);
    }

    #[test]
    fn json_document_uses_camel_case() {
        let snapshot = OfflineSnapshot::capture(sample_state(), 1).unwrap();
        let value: Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert!(value.get("userProfile").is_some());
        assert!(value.get("lastSyncedAt").is_some());
        assert!(value.get("sizeBytes").is_some());
    }

    #[test]
    fn from_json_rejects_malformed_document() {
        assert!(OfflineSnapshot::from_json("{\"items\": [").is_err());
    }
}
