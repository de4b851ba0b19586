//! Conversation state machine.
//!
//! Pure and synchronous: it never touches the network. The driver in
//! [`super::engine`] feeds it submissions, decoded events and failures.
//!
//! ```text
//! Idle --submit--> Sending --first delta--> Streaming --done--> Idle
//!                     |                        |
//!                     +--------failure---------+--> Error --dismiss/submit--> Idle
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{ChatError, ValidationError};
use crate::models::{ChatOptions, ChatRequest, Turn, TurnState};
use crate::sse::StreamEvent;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    /// Request sent, no content received yet
    Sending,
    /// At least one delta received
    Streaming,
    /// Last turn failed; see `last_error`
    Error,
}

impl SessionStatus {
    /// Whether a turn is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionStatus::Sending | SessionStatus::Streaming)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Sending => "sending",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Effect of folding one event into the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnUpdate {
    /// Text appended to the live assistant turn. `started` is set for the
    /// delta that created the turn.
    Delta { text: String, started: bool },
    /// The turn finished successfully; carries the final answer.
    Completed(Turn),
    /// The turn failed.
    Failed(ChatError),
    /// No turn was in flight; the event was dropped.
    Ignored,
}

/// One chat session: an id, its ordered turns and its status.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    turns: Vec<Turn>,
    status: SessionStatus,
    last_error: Option<ChatError>,
}

impl Conversation {
    /// Start an empty conversation with a fresh id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
            status: SessionStatus::Idle,
            last_error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The error that moved the session into `Error`, if it is still there.
    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    /// Accept a user message and build the request for it.
    ///
    /// The request's history is every turn before this message. Rejected
    /// submissions leave the conversation untouched. Submitting from
    /// `Error` dismisses the error first.
    pub fn submit(&mut self, text: &str, options: &ChatOptions) -> Result<ChatRequest, ValidationError> {
        if self.status.is_busy() {
            return Err(ValidationError::TurnInFlight {
                status: self.status,
            });
        }
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        self.dismiss_error();

        let history = self.turns.clone();
        self.turns.push(Turn::user(text));
        self.status = SessionStatus::Sending;

        Ok(ChatRequest::new(self.id.clone(), text, history).with_options(options))
    }

    /// Fold one decoded event into the in-flight turn.
    pub fn apply(&mut self, event: &StreamEvent) -> TurnUpdate {
        if !self.status.is_busy() {
            tracing::warn!(
                session_id = %self.id,
                event = event.event_type_name(),
                status = %self.status,
                "Dropped event with no turn in flight"
            );
            return TurnUpdate::Ignored;
        }

        match event {
            StreamEvent::ContentDelta { text } => {
                let started = self.status == SessionStatus::Sending;
                if started {
                    self.turns.push(Turn::streaming_assistant());
                    self.status = SessionStatus::Streaming;
                }
                if let Some(turn) = self.turns.last_mut() {
                    turn.content.push_str(text);
                }
                TurnUpdate::Delta {
                    text: text.clone(),
                    started,
                }
            }
            StreamEvent::Done => {
                if self.status == SessionStatus::Sending {
                    self.turns.push(Turn::streaming_assistant());
                }
                let answer = self
                    .turns
                    .last_mut()
                    .map(|turn| {
                        turn.state = TurnState::Complete;
                        turn.clone()
                    })
                    .unwrap_or_else(|| Turn::assistant(""));
                self.status = SessionStatus::Idle;
                TurnUpdate::Completed(answer)
            }
            StreamEvent::Error { message } => {
                let error = ChatError::Backend {
                    message: message.clone(),
                };
                self.fail(error.clone());
                TurnUpdate::Failed(error)
            }
        }
    }

    /// End the in-flight turn with an error.
    ///
    /// Partial assistant content is kept and marked failed. Returns `false`
    /// if no turn was in flight.
    pub fn fail(&mut self, error: ChatError) -> bool {
        if !self.status.is_busy() {
            return false;
        }

        if let Some(turn) = self.turns.last_mut().filter(|t| t.is_streaming()) {
            turn.state = TurnState::Failed;
        }

        tracing::error!(
            session_id = %self.id,
            code = error.error_code(),
            error = %error,
            "Turn failed"
        );
        self.status = SessionStatus::Error;
        self.last_error = Some(error);
        true
    }

    /// Leave the `Error` state. Returns `false` if there was nothing to
    /// dismiss.
    pub fn dismiss_error(&mut self) -> bool {
        if self.status != SessionStatus::Error {
            return false;
        }
        self.status = SessionStatus::Idle;
        self.last_error = None;
        true
    }

    /// The last completed answer and the user message it answers, as a
    /// `(term, explanation)` pair.
    pub fn bookmark_candidate(&self) -> Option<(String, String)> {
        if self.status.is_busy() {
            return None;
        }
        let (answer, earlier) = self.turns.split_last()?;
        if !answer.is_completed_answer() || answer.content.trim().is_empty() {
            return None;
        }
        let question = earlier.last()?;
        Some((question.content.trim().to_string(), answer.content.clone()))
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
