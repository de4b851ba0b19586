//! Transport-level error types.
//!
//! Everything that goes wrong between "request built" and "bytes handed to
//! the framer": non-2xx statuses, refused connections, reads that fail
//! halfway through a streamed turn, and connections that close before the
//! server sent a terminal record.

use std::fmt;

/// Transport-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered with a non-2xx status. `body` is the raw response
    /// body, kept verbatim as error detail.
    Status { status: u16, body: String },

    /// Could not connect to the backend.
    Connection { url: String, message: String },

    /// Request or read timed out.
    Timeout { message: String },

    /// A read failed after the stream had started.
    Interrupted { message: String },

    /// The server closed the stream without a terminal record. `trailing`
    /// holds any undelimited bytes that were left in the framer.
    StreamClosed { trailing: Option<String> },

    /// The request URL could not be built.
    InvalidUrl(String),

    /// Anything reqwest reports that fits none of the above.
    Other(String),
}

impl TransportError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            TransportError::Connection { .. }
            | TransportError::Timeout { .. }
            | TransportError::Interrupted { .. }
            | TransportError::StreamClosed { .. } => true,
            TransportError::InvalidUrl(_) | TransportError::Other(_) => false,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status { status, body } => match *status {
                400 => "The request was rejected by the server.".to_string(),
                401 | 403 => "The server refused the request. Check your API key.".to_string(),
                404 => "The chat endpoint was not found on the server.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 if !body.is_empty() => {
                    format!("The server is having trouble ({}): {}", status, body)
                }
                500..=599 => "The server is experiencing issues. Please try again later.".to_string(),
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            TransportError::Connection { .. } => {
                "Unable to reach the assistant. Please check your connection.".to_string()
            }
            TransportError::Timeout { .. } => {
                "The assistant took too long to respond.".to_string()
            }
            TransportError::Interrupted { .. } => {
                "The connection dropped while the answer was streaming.".to_string()
            }
            TransportError::StreamClosed { .. } => {
                "The answer ended unexpectedly before it was complete.".to_string()
            }
            TransportError::InvalidUrl(_) => "The backend address is invalid.".to_string(),
            TransportError::Other(message) => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Status { .. } => "E_NET_HTTP",
            TransportError::Connection { .. } => "E_NET_CONN",
            TransportError::Timeout { .. } => "E_NET_TIMEOUT",
            TransportError::Interrupted { .. } => "E_NET_INTERRUPTED",
            TransportError::StreamClosed { .. } => "E_NET_CLOSED",
            TransportError::InvalidUrl(_) => "E_NET_URL",
            TransportError::Other(_) => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status { status, body } => {
                write!(f, "HTTP {}: {}", status, body)
            }
            TransportError::Connection { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            TransportError::Timeout { message } => write!(f, "Timed out: {}", message),
            TransportError::Interrupted { message } => {
                write!(f, "Stream interrupted: {}", message)
            }
            TransportError::StreamClosed { trailing } => match trailing {
                Some(tail) => write!(
                    f,
                    "Stream closed before completion ({} undelimited bytes left)",
                    tail.len()
                ),
                None => write!(f, "Stream closed before completion"),
            },
            TransportError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            TransportError::Other(message) => write!(f, "Transport error: {}", message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Classify a reqwest error raised while sending a request to `url`.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            message: err.to_string(),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_builder() {
        TransportError::InvalidUrl(url.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status {
            status: status.as_u16(),
            body: err.to_string(),
        }
    } else {
        TransportError::Other(err.to_string())
    }
}

/// Classify a reqwest error raised while reading a response body.
pub fn classify_body_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            message: err.to_string(),
        }
    } else {
        TransportError::Interrupted {
            message: err.to_string(),
        }
    }
}
