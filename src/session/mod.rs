//! Chat sessions.
//!
//! - `conversation` - the synchronous state machine (`Conversation`)
//! - `engine` - the async driver that talks to the backend (`ChatSession`)

mod conversation;
mod engine;

pub use conversation::{Conversation, SessionStatus, TurnUpdate};
pub use engine::{ChatSession, SessionUpdate};
