//! Line-oriented event stream parsing.
//!
//! The chat backend answers with a stream of newline-delimited records;
//! the ones that matter look like
//!
//! ```text
//! data: {"type":"content","delta":"Hel"}
//! data: {"type":"content","delta":"lo"}
//! data: {"type":"done"}
//! ```
//!
//! # Module structure
//! - `framer` - rebuilds records from arbitrarily split reads (`LineFramer`)
//! - `decoder` - maps one record to a `StreamEvent` (`decode_record`)
//! - `events` - the `StreamEvent` type
//! - `payloads` - internal payload deserialization structs

mod decoder;
mod events;
mod framer;
mod payloads;

pub use decoder::{decode_payload, decode_record, DATA_PREFIX};
pub use events::StreamEvent;
pub use framer::{LineFramer, Records};
