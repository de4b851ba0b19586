//! Input validation errors.
//!
//! These are decided locally, before any network call, and never move a
//! session out of its current state.

use std::fmt;

use crate::session::SessionStatus;

/// Reasons a submission is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The message was empty or whitespace only.
    EmptyMessage,

    /// Another turn is still sending or streaming in this session.
    TurnInFlight { status: SessionStatus },
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::EmptyMessage => "Type a term or question first.".to_string(),
            ValidationError::TurnInFlight { .. } => {
                "Please wait for the current response to complete before sending another message."
                    .to_string()
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::EmptyMessage => "E_INPUT_EMPTY",
            ValidationError::TurnInFlight { .. } => "E_INPUT_BUSY",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyMessage => write!(f, "Message is empty"),
            ValidationError::TurnInFlight { status } => {
                write!(f, "A turn is already in flight (status: {})", status)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
