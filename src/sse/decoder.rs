//! Record decoding.
//!
//! Maps one framed record to at most one [`StreamEvent`]. Only records that
//! start with the literal `data: ` prefix carry a payload; everything else
//! (comments, `event:` lines, keepalives) is ignored without error.

use crate::error::ProtocolError;

use super::events::StreamEvent;
use super::payloads::{TypeProbe, WirePayload, KNOWN_EVENT_TYPES};

/// Prefix marking a payload-carrying record.
pub const DATA_PREFIX: &str = "data: ";

/// Decode a single framed record.
///
/// Returns:
/// - `Ok(Some(event))` - the record carried a known event
/// - `Ok(None)` - the record carries no payload and is ignored
/// - `Err(error)` - the payload is malformed or has an unknown type
pub fn decode_record(record: &str) -> Result<Option<StreamEvent>, ProtocolError> {
    let Some(payload) = record.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };

    decode_payload(payload).map(Some)
}

/// Decode the JSON payload of a `data: ` record.
pub fn decode_payload(payload: &str) -> Result<StreamEvent, ProtocolError> {
    match serde_json::from_str::<WirePayload>(payload) {
        Ok(wire) => Ok(wire.into()),
        Err(err) => Err(explain_failure(payload, err)),
    }
}

/// Tell an unknown `type` apart from a payload that is simply broken.
fn explain_failure(payload: &str, err: serde_json::Error) -> ProtocolError {
    if let Ok(TypeProbe {
        event_type: Some(event_type),
    }) = serde_json::from_str::<TypeProbe>(payload)
    {
        if !KNOWN_EVENT_TYPES.contains(&event_type.as_str()) {
            return ProtocolError::UnknownEventType { event_type };
        }
    }

    ProtocolError::MalformedPayload {
        payload: payload.to_string(),
        message: err.to_string(),
    }
}
