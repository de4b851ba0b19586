//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST, streaming, multipart)
//! - [`BookmarkSink`] - vocabulary entry storage

pub mod bookmarks;
pub mod http;

pub use bookmarks::BookmarkSink;
pub use http::{ByteStream, FilePart, Headers, HttpClient, MultipartForm, Response};
