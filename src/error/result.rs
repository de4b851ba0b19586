//! Result type alias for chat operations.

use super::chat_error::ChatError;

/// Type alias for Results using ChatError.
///
/// # Example
///
/// ```ignore
/// use glossa::error::ChatResult;
///
/// async fn explain(session: &ChatSession, term: &str) -> ChatResult<Turn> {
///     session.send(term).await
/// }
/// ```
pub type ChatResult<T> = Result<T, ChatError>;
