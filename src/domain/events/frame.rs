//! Wire frame: `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::RealtimeError;

/// Event name of the handshake frame a client sends first.
pub const HANDSHAKE_EVENT: &str = "handshake";

/// Event name the backend answers with when it accepts a handshake.
pub const HANDSHAKE_ACK_EVENT: &str = "handshake_ack";

/// Event name the backend answers with when it refuses a handshake.
pub const HANDSHAKE_REJECTED_EVENT: &str = "handshake_rejected";

/// One named event with an opaque JSON payload, as carried by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn to_text(&self) -> Result<String, RealtimeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_text(text: &str) -> Result<Self, RealtimeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, RealtimeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_data_defaults_to_null() {
        let frame = Frame::from_text(r#"{"event":"handshake_ack"}"#).unwrap();
        assert_eq!(frame.event, HANDSHAKE_ACK_EVENT);
        assert_eq!(frame.data, Value::Null);
    }

    #[test]
    fn text_form_uses_event_and_data_keys() {
        let text = Frame::new("join_room", json!({"roomId": "r1"})).to_text().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"event": "join_room", "data": {"roomId": "r1"}}));
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let err = Frame::from_text("not json").unwrap_err();
        assert!(matches!(err, RealtimeError::Codec(_)));
    }
}
