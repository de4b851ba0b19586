//! Mock implementations for testing.
//!
//! These enable unit testing without network access or file system access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses and streams
//! - [`InMemoryBookmarks`] - In-memory vocabulary storage

pub mod bookmarks;
pub mod http;

pub use bookmarks::InMemoryBookmarks;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
