//! Queued actions (outbox entries).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ActionId, CodecError};

/// A mutation recorded while it could not be applied remotely.
///
/// Immutable once queued; the only allowed change is removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    /// Unique, monotonically assigned identifier.
    pub id: ActionId,
    /// Tag identifying the mutation kind (opaque to offsync).
    pub action_type: String,
    /// Opaque mutation data.
    pub payload: Value,
    /// Enqueue time in unix milliseconds.
    pub created_at: u64,
}

impl PendingAction {
    /// Create a new pending action.
    pub fn new(id: ActionId, action_type: impl Into<String>, payload: Value, created_at: u64) -> Self {
        Self {
            id,
            action_type: action_type.into(),
            payload,
            created_at,
        }
    }
}

/// Serialize a whole queue to its persisted JSON form.
pub fn encode_queue(actions: &[PendingAction]) -> Result<String, CodecError> {
    serde_json::to_string(actions).map_err(CodecError::Serialization)
}

/// Parse a persisted queue, preserving its order.
pub fn decode_queue(raw: &str) -> Result<Vec<PendingAction>, CodecError> {
    serde_json::from_str(raw).map_err(CodecError::Deserialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action(id: u64, kind: &str) -> PendingAction {
        PendingAction::new(ActionId::new(id), kind, json!({ "pixel": id }), 1_705_000_000_000)
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(action(1, "buy_pixel")).unwrap();
        assert_eq!(json["actionType"], "buy_pixel");
        assert_eq!(json["createdAt"], 1_705_000_000_000u64);
        assert_eq!(json["id"], 1);
    }

    #[test]
    fn queue_order_survives_persistence() {
        let queue = vec![action(3, "c"), action(1, "a"), action(2, "b")];

        let restored = decode_queue(&encode_queue(&queue).unwrap()).unwrap();

        let kinds: Vec<_> = restored.iter().map(|a| a.action_type.as_str()).collect();
        assert_eq!(kinds, vec!["c", "a", "b"]);
    }

    #[test]
    fn float_payloads_survive_persistence_exactly() {
        let prices = [907.3038322028689, 0.1 + 0.2, 5e-324, f64::MAX];
        let queue: Vec<_> = prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                PendingAction::new(
                    ActionId::new(i as u64 + 1),
                    "buy_pixel",
                    json!({ "price": price }),
                    1_705_000_000_000,
                )
            })
            .collect();

        let restored = decode_queue(&encode_queue(&queue).unwrap()).unwrap();

        assert_eq!(restored, queue);
        for (action, price) in restored.iter().zip(prices) {
            assert_eq!(action.payload["price"].as_f64(), Some(price));
        }
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(matches!(
            decode_queue("[{\"id\": 1,"),
            Err(CodecError::Deserialization(_))
        ));
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        assert!(decode_queue("{\"id\": 1}").is_err());
    }
}
