//! Wire-protocol error types.
//!
//! Raised when a framed record cannot be turned into a known stream event.
//! These always fail the in-flight turn; a record that is silently skipped
//! would leave the assistant turn out of sync with what the server sent.

use std::fmt;

/// Protocol-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The `data: ` payload was not valid JSON or did not match the shape
    /// of its declared type.
    MalformedPayload { payload: String, message: String },

    /// The payload declared a `type` this client does not know.
    UnknownEventType { event_type: String },

    /// A record was not valid UTF-8.
    InvalidUtf8 { message: String },
}

impl ProtocolError {
    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ProtocolError::MalformedPayload { .. } => {
                "Received a malformed message from the server.".to_string()
            }
            ProtocolError::UnknownEventType { event_type } => format!(
                "Received unknown message type '{}'. Your client may need to be updated.",
                event_type
            ),
            ProtocolError::InvalidUtf8 { .. } => {
                "Received unreadable text from the server.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::MalformedPayload { .. } => "E_PROTO_JSON",
            ProtocolError::UnknownEventType { .. } => "E_PROTO_UNKNOWN",
            ProtocolError::InvalidUtf8 { .. } => "E_PROTO_UTF8",
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedPayload { payload, message } => {
                write!(f, "Malformed payload '{}': {}", payload, message)
            }
            ProtocolError::UnknownEventType { event_type } => {
                write!(f, "Unknown event type: {}", event_type)
            }
            ProtocolError::InvalidUtf8 { message } => {
                write!(f, "Record is not valid UTF-8: {}", message)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::UnknownEventType {
            event_type: "unknown".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown event type: unknown");
        assert!(err.user_message().contains("'unknown'"));

        let err = ProtocolError::MalformedPayload {
            payload: "{oops".to_string(),
            message: "expected value".to_string(),
        };
        assert!(err.to_string().contains("{oops"));
        assert_eq!(err.error_code(), "E_PROTO_JSON");
    }
}
