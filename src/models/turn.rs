use serde::{Deserialize, Serialize};

/// Role of a turn in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of a single turn.
///
/// Only the assistant turn of the in-flight call is ever `Streaming`; it
/// becomes `Complete` on `Done` and `Failed` on any error. Failed turns keep
/// whatever content streamed before the failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Complete,
    Streaming,
    Failed,
}

/// One message in a conversation.
///
/// Serializes to the wire shape `{role, content}`; the lifecycle state is
/// client-side only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    pub state: TurnState,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            state: TurnState::Complete,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            state: TurnState::Complete,
        }
    }

    /// An empty assistant turn that deltas will be appended to.
    pub(crate) fn streaming_assistant() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            state: TurnState::Streaming,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.state == TurnState::Streaming
    }

    pub fn is_failed(&self) -> bool {
        self.state == TurnState::Failed
    }

    /// A finished assistant answer, eligible to become a vocabulary entry.
    pub fn is_completed_answer(&self) -> bool {
        self.role == Role::Assistant && self.state == TurnState::Complete
    }
}
