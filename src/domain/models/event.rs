//! External event model.
//!
//! Events are produced by the companion web application and pushed onto a
//! shared queue as JSON documents:
//!
//! ```json
//! {"id": "…", "type": "bot_account_linked", "timestamp": 1700000000.0,
//!  "payload": {"token": "…", "user_id": 42}}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event type posting an arbitrary message to a linked user.
pub const USER_EVENT: &str = "user_event";

/// Event type confirming that a one-time link token was redeemed.
pub const BOT_ACCOUNT_LINKED: &str = "bot_account_linked";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    /// Request-scoped identifier, not unique across the system
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub timestamp: f64,
}

impl ExternalEvent {
    /// Decode a queue entry. Unknown keys are ignored.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Decode the payload into a handler-specific shape.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }
}

/// Payload of [`USER_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserMessagePayload {
    pub user_id: i64,
    pub message: String,
}

/// Payload of [`BOT_ACCOUNT_LINKED`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountLinkedPayload {
    pub token: String,
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_ignores_unknown_keys() {
        let bytes = br#"{"id":"a1","type":"user_event","timestamp":17,"payload":{"user_id":3,"message":"hi"},"extra":true}"#;
        let event = ExternalEvent::from_slice(bytes).unwrap();

        assert_eq!(event.event_type, USER_EVENT);
        assert!((event.timestamp - 17.0).abs() < f64::EPSILON);

        let payload: UserMessagePayload = event.payload_as().unwrap();
        assert_eq!(payload.user_id, 3);
        assert_eq!(payload.message, "hi");
    }

    #[test]
    fn test_missing_required_key() {
        let bytes = br#"{"id":"a1","type":"user_event","payload":{}}"#;
        assert!(ExternalEvent::from_slice(bytes).is_err());
    }

    #[test]
    fn test_payload_must_be_object() {
        let bytes = br#"{"id":"a1","type":"user_event","timestamp":1,"payload":[1,2]}"#;
        assert!(ExternalEvent::from_slice(bytes).is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(ExternalEvent::from_slice(b"{not json").is_err());
    }
}
