//! Error handling for glossa.
//!
//! - **Error Categories**: high-level classification for retry and messaging
//! - **Domain errors**: transport, protocol, validation, storage
//! - **Unified turn error**: `ChatError` ends (or prevents) a chat turn
//!
//! | Error | Raised when | Session effect |
//! |-------|-------------|----------------|
//! | `ValidationError` | empty input, turn already in flight | none, submission is a no-op |
//! | `TransportError` | non-2xx status, network failure, premature close | turn fails, session -> `Error` |
//! | `ProtocolError` | a record cannot be decoded | turn fails, session -> `Error` |
//! | `StorageError` | bookmark store IO | none, reported to the caller |

mod category;
mod chat_error;
mod protocol;
mod result;
mod storage;
mod transport;
mod validation;

pub use category::ErrorCategory;
pub use chat_error::ChatError;
pub use protocol::ProtocolError;
pub use result::ChatResult;
pub use storage::StorageError;
pub use transport::{classify_body_error, classify_reqwest_error, TransportError};
pub use validation::ValidationError;
