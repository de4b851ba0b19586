//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`JsonFileBookmarks`] - vocabulary stored as a JSON file
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Scripted HTTP responses and streams
//! - [`mock::InMemoryBookmarks`] - In-memory vocabulary storage

pub mod file_bookmarks;
pub mod mock;
pub mod reqwest_http;

pub use file_bookmarks::JsonFileBookmarks;
pub use mock::{InMemoryBookmarks, MockHttpClient, MockResponse};
pub use reqwest_http::ReqwestHttpClient;
