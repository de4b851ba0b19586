//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses, scripted chunk streams, or errors. Streams handed out by the
//! mock count how often they are torn down, so tests can check that a
//! connection is released exactly once.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use crate::error::TransportError;
use crate::traits::{ByteStream, Headers, HttpClient, MultipartForm, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
    /// Multipart form (for upload requests)
    pub form: Option<MultipartForm>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful response
    Success(Response),
    /// Fail before any body is produced
    Error(TransportError),
    /// Stream the given chunks, then end
    Stream(Vec<Bytes>),
    /// Stream the given chunks, then fail with the error
    StreamThenError(Vec<Bytes>, TransportError),
    /// Stream the given chunks, then stall forever
    Stall(Vec<Bytes>),
}

/// Drops of this wrapper are counted as connection teardowns.
struct TrackedStream {
    inner: ByteStream,
    closed: Arc<AtomicUsize>,
}

impl Stream for TrackedStream {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock HTTP client for testing.
///
/// Responses are looked up per URL: queued one-shot responses first, then
/// the fixed response for that URL (exact, then prefix match), then the
/// default.
///
/// # Example
///
/// ```ignore
/// use glossa::adapters::mock::{MockHttpClient, MockResponse};
/// use bytes::Bytes;
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "http://localhost:8000/api/chat/stream",
///     MockResponse::Stream(vec![Bytes::from("data: {\"type\":\"done\"}\n")]),
/// );
///
/// // ... drive a session ...
///
/// assert_eq!(client.streams_opened(), 1);
/// assert_eq!(client.streams_closed(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// One-shot responses consumed in order
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            queued: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set a response for a specific URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a one-shot response for a URL.
    pub fn enqueue_response(&self, url: &str, response: MockResponse) {
        let mut queued = self.queued.lock().unwrap();
        queued.entry(url.to_string()).or_default().push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Number of body streams handed out.
    pub fn streams_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of body streams dropped.
    pub fn streams_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn record_request(
        &self,
        method: &str,
        url: &str,
        headers: &Headers,
        body: Option<String>,
        form: Option<MultipartForm>,
    ) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
            form,
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        if let Some(queue) = self.queued.lock().unwrap().get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }

        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    fn respond(&self, url: &str) -> Result<Response, TransportError> {
        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(_) => Err(TransportError::Other(
                "Stream response on non-stream request".to_string(),
            )),
            None => Err(TransportError::Other(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }

    fn track(&self, inner: ByteStream) -> ByteStream {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Box::pin(TrackedStream {
            inner,
            closed: Arc::clone(&self.closed),
        })
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn chunk_stream(chunks: Vec<Bytes>) -> impl Stream<Item = Result<Bytes, TransportError>> + Send {
    stream::iter(chunks.into_iter().map(Ok))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError> {
        self.record_request("GET", url, headers, None, None);
        self.respond(url)
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, TransportError> {
        self.record_request("POST", url, headers, Some(body.to_string()), None);
        self.respond(url)
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError> {
        self.record_request("POST", url, headers, Some(body.to_string()), None);

        let inner: ByteStream = match self.get_response(url) {
            Some(MockResponse::Stream(chunks)) => Box::pin(chunk_stream(chunks)),
            Some(MockResponse::StreamThenError(chunks, err)) => {
                Box::pin(chunk_stream(chunks).chain(stream::once(async move { Err(err) })))
            }
            Some(MockResponse::Stall(chunks)) => {
                Box::pin(chunk_stream(chunks).chain(stream::pending()))
            }
            Some(MockResponse::Error(err)) => return Err(err),
            Some(MockResponse::Success(_)) => {
                return Err(TransportError::Other(
                    "Non-stream response on stream request".to_string(),
                ))
            }
            None => {
                return Err(TransportError::Other(format!(
                    "No mock response for URL: {}",
                    url
                )))
            }
        };

        Ok(self.track(inner))
    }

    async fn post_multipart(
        &self,
        url: &str,
        form: MultipartForm,
        headers: &Headers,
    ) -> Result<Response, TransportError> {
        self.record_request("POST", url, headers, None, Some(form));
        self.respond(url)
    }
}
