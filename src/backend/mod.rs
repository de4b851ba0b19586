//! Backend API client.
//!
//! One HTTP exchange per call. The chat endpoint streams its answer and is
//! exposed as an [`EventStream`]; every other endpoint is a plain
//! request/response call.

mod documents;
mod stream;

pub use stream::EventStream;

use std::sync::Arc;

use crate::error::{ChatError, TransportError};
use crate::models::ChatRequest;
use crate::traits::{Headers, HttpClient};

/// Default backend location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const CHAT_STREAM_PATH: &str = "/api/chat/stream";
pub const HEALTH_PATH: &str = "/api/health";
pub const DOCUMENT_UPLOAD_PATH: &str = "/api/documents/upload";
pub const DOCUMENT_CHAT_PATH: &str = "/api/documents/chat";

/// Client for the inference backend.
///
/// Cheap to clone; clones share the underlying HTTP client.
#[derive(Clone)]
pub struct BackendClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    api_key: Option<String>,
}

impl BackendClient {
    /// Create a client for `base_url`. A trailing `/` is ignored.
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        if let Some(key) = &self.api_key {
            headers.insert("Authorization".to_string(), format!("Bearer {}", key));
        }
        headers
    }

    fn json_headers(&self) -> Headers {
        let mut headers = self.headers();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    /// Open the streaming chat call for one turn.
    ///
    /// The whole request, history included, is sent before anything is
    /// read. A non-2xx status fails here with the status and the raw
    /// response body; no stream is returned in that case.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream, ChatError> {
        let url = self.url(CHAT_STREAM_PATH);
        let body = serde_json::to_string(request)
            .map_err(|e| TransportError::Other(format!("Failed to encode request: {}", e)))?;

        let mut headers = self.json_headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        tracing::debug!(
            session_id = %request.session_id,
            history = request.history.len(),
            "Opening chat stream"
        );

        let body = self.http.post_stream(&url, &body, &headers).await?;
        Ok(EventStream::new(body))
    }

    /// Check if the backend is reachable and healthy.
    ///
    /// # Returns
    /// `true` if the health endpoint answers 2xx, `false` for any other
    /// status. Connection failures are errors.
    pub async fn health_check(&self) -> Result<bool, ChatError> {
        let response = self.http.get(&self.url(HEALTH_PATH), &self.headers()).await?;
        Ok(response.is_success())
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}
