//! Unified error type for a chat turn.
//!
//! `ChatError` is what a streaming call and the session driver report. It
//! wraps the three domain taxonomies plus the two ways a turn can end that
//! are neither transport nor protocol faults: the server reporting an error
//! in-band, and the caller cancelling.

use std::fmt;

use super::category::ErrorCategory;
use super::protocol::ProtocolError;
use super::transport::TransportError;
use super::validation::ValidationError;

/// Error that ends (or prevents) a chat turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatError {
    /// HTTP status or network failure.
    Transport(TransportError),

    /// A record could not be decoded into a known event.
    Protocol(ProtocolError),

    /// Input rejected before any network call.
    Validation(ValidationError),

    /// The server sent an in-band `error` record.
    Backend { message: String },

    /// The caller abandoned the turn before it completed.
    Cancelled,
}

impl ChatError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Transport(TransportError::Status { status, .. }) if *status < 500 => {
                ErrorCategory::Client
            }
            ChatError::Transport(TransportError::Status { .. }) => ErrorCategory::Server,
            ChatError::Transport(TransportError::InvalidUrl(_)) => ErrorCategory::Configuration,
            ChatError::Transport(_) => ErrorCategory::Network,
            ChatError::Protocol(_) => ErrorCategory::Client,
            ChatError::Validation(_) | ChatError::Cancelled => ErrorCategory::User,
            ChatError::Backend { .. } => ErrorCategory::Server,
        }
    }

    /// Check if sending the same message again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Transport(err) => err.is_retryable(),
            ChatError::Backend { .. } | ChatError::Cancelled => true,
            ChatError::Protocol(_) | ChatError::Validation(_) => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Transport(err) => err.user_message(),
            ChatError::Protocol(err) => err.user_message(),
            ChatError::Validation(err) => err.user_message(),
            ChatError::Backend { message } => format!("The assistant reported an error: {}", message),
            ChatError::Cancelled => "Response cancelled.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Transport(err) => err.error_code(),
            ChatError::Protocol(err) => err.error_code(),
            ChatError::Validation(err) => err.error_code(),
            ChatError::Backend { .. } => "E_BACKEND",
            ChatError::Cancelled => "E_CANCELLED",
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Transport(err) => write!(f, "{}", err),
            ChatError::Protocol(err) => write!(f, "{}", err),
            ChatError::Validation(err) => write!(f, "{}", err),
            ChatError::Backend { message } => write!(f, "Backend error: {}", message),
            ChatError::Cancelled => write!(f, "Turn cancelled"),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::Transport(err) => Some(err),
            ChatError::Protocol(err) => Some(err),
            ChatError::Validation(err) => Some(err),
            ChatError::Backend { .. } | ChatError::Cancelled => None,
        }
    }
}

impl From<TransportError> for ChatError {
    fn from(err: TransportError) -> Self {
        ChatError::Transport(err)
    }
}

impl From<ProtocolError> for ChatError {
    fn from(err: ProtocolError) -> Self {
        ChatError::Protocol(err)
    }
}

impl From<ValidationError> for ChatError {
    fn from(err: ValidationError) -> Self {
        ChatError::Validation(err)
    }
}
