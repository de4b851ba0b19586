//! Payload deserialization structs for `data: ` records.
//!
//! The enum is closed: a `type` that is not listed here fails to
//! deserialize and becomes a protocol error.

use serde::Deserialize;

use super::events::StreamEvent;

/// Tags this client understands.
pub(crate) const KNOWN_EVENT_TYPES: &[&str] = &["content", "done", "error"];

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum WirePayload {
    Content { delta: String },
    Done,
    Error { message: String },
}

impl From<WirePayload> for StreamEvent {
    fn from(payload: WirePayload) -> Self {
        match payload {
            WirePayload::Content { delta } => StreamEvent::ContentDelta { text: delta },
            WirePayload::Done => StreamEvent::Done,
            WirePayload::Error { message } => StreamEvent::Error { message },
        }
    }
}

/// Loose view of a payload, used only to explain a decode failure.
#[derive(Debug, Deserialize)]
pub(crate) struct TypeProbe {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}
