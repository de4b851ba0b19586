//! Common test utilities for integration tests.
//!
//! Fixtures for building sessions over the mock HTTP client and for
//! writing SSE records the way the backend sends them.

#![allow(dead_code)]

use bytes::Bytes;
use std::sync::Arc;

pub use glossa::adapters::mock::{InMemoryBookmarks, MockHttpClient, MockResponse};
use glossa::backend::BackendClient;
use glossa::session::ChatSession;

/// Base URL the mock backend answers on.
pub const BASE_URL: &str = "http://backend.test";

/// Full URL of the streaming chat endpoint on the mock backend.
pub const CHAT_URL: &str = "http://backend.test/api/chat/stream";

/// A `content` record, newline-terminated.
pub fn content(delta: &str) -> String {
    format!(
        "data: {}\n",
        serde_json::json!({ "type": "content", "delta": delta })
    )
}

/// A `done` record, newline-terminated.
pub fn done() -> String {
    "data: {\"type\":\"done\"}\n".to_string()
}

/// Turn string chunks into a scripted stream.
pub fn chunks<S: AsRef<str>>(parts: &[S]) -> Vec<Bytes> {
    parts
        .iter()
        .map(|p| Bytes::copy_from_slice(p.as_ref().as_bytes()))
        .collect()
}

/// A stream answering with the given deltas, then `done`.
pub fn answer(deltas: &[&str]) -> MockResponse {
    let mut parts: Vec<String> = deltas.iter().map(|d| content(d)).collect();
    parts.push(done());
    MockResponse::Stream(chunks(&parts))
}

pub fn backend(mock: &MockHttpClient) -> BackendClient {
    BackendClient::new(Arc::new(mock.clone()), BASE_URL)
}

pub fn session(mock: &MockHttpClient) -> Arc<ChatSession> {
    Arc::new(ChatSession::new(backend(mock)))
}
