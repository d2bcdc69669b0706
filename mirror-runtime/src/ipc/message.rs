// Protocol envelope. On the wire a message is one JSON record:
// `{"type": <tag>, "payload": "<json text>", "requestId": <n>}`.

use mirror_ffi::{MessageFamily, MessageType};
use serde::{Deserialize, Serialize};

use crate::error::MirrorResult;

/// One protocol message. `payload` is itself JSON text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type", with = "type_tag")]
    pub message_type: MessageType,
    pub payload: String,
    #[serde(rename = "requestId")]
    pub request_id: u32,
}

impl Message {
    pub fn new(message_type: MessageType, payload: impl Into<String>, request_id: u32) -> Self {
        Message { message_type, payload: payload.into(), request_id }
    }

    /// Reply correlated to `request_id`.
    pub fn response(payload: impl Into<String>, request_id: u32) -> Self {
        Message::new(MessageType::Response, payload, request_id)
    }

    /// Unsolicited server push; events carry request id 0.
    pub fn event(message_type: MessageType, payload: impl Into<String>) -> Self {
        Message::new(message_type, payload, 0)
    }

    pub fn family(&self) -> MessageFamily {
        self.message_type.family()
    }

    pub fn is_event(&self) -> bool {
        self.family() == MessageFamily::Event
    }

    pub fn to_json(&self) -> MirrorResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> MirrorResult<Message> {
        Ok(serde_json::from_str(text)?)
    }
}

/// `MessageType` travels as its integer tag.
mod type_tag {
    use mirror_ffi::MessageType;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &MessageType, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(*t as u32)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<MessageType, D::Error> {
        let raw = u32::deserialize(d)?;
        MessageType::from_raw(raw).ok_or_else(|| D::Error::custom(format!("unknown message type tag {raw}")))
    }
}
