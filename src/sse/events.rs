//! Typed stream events.

/// One decoded event from the chat stream.
///
/// Exactly one terminal event (`Done` or `Error`) ends a turn; nothing
/// follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental assistant output
    ContentDelta { text: String },
    /// Stream completed successfully
    Done,
    /// The backend reported a failure in-band
    Error { message: String },
}

impl StreamEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        StreamEvent::ContentDelta { text: text.into() }
    }

    /// Whether this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }

    /// Returns the event type name as a string for logging.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            StreamEvent::ContentDelta { .. } => "content",
            StreamEvent::Done => "done",
            StreamEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(StreamEvent::Done.is_terminal());
        assert!(StreamEvent::Error {
            message: "x".to_string()
        }
        .is_terminal());
        assert!(!StreamEvent::delta("Hel").is_terminal());
    }

    #[test]
    fn test_event_type_name() {
        assert_eq!(StreamEvent::delta("").event_type_name(), "content");
        assert_eq!(StreamEvent::Done.event_type_name(), "done");
    }
}
