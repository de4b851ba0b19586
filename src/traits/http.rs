//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for HTTP operations, enabling
//! dependency injection and mocking in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

use crate::error::TransportError;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Body of a streamed response. Dropping it closes the connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HTTP response wrapper.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Turn a non-2xx response into a [`TransportError::Status`] carrying
    /// the raw body.
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            })
        }
    }
}

/// One file attached to a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// A `multipart/form-data` body: plain text fields plus optional files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }
}

/// Trait for HTTP client operations.
///
/// Implementations include the production reqwest-based client and the
/// scripted mock used by the session tests.
///
/// # Example
///
/// ```ignore
/// use glossa::traits::{HttpClient, Headers};
///
/// async fn probe<C: HttpClient>(client: &C) -> bool {
///     client
///         .get("http://localhost:8000/api/health", &Headers::new())
///         .await
///         .map(|r| r.is_success())
///         .unwrap_or(false)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError>;

    /// Perform a POST request with a string body.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, TransportError>;

    /// Perform a POST request and return the body as a stream of chunks.
    ///
    /// The whole request body is sent before any response is read. A non-2xx
    /// status fails with [`TransportError::Status`] carrying the response
    /// body; no stream is returned in that case.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError>;

    /// Perform a `multipart/form-data` POST request.
    async fn post_multipart(
        &self,
        url: &str,
        form: MultipartForm,
        headers: &Headers,
    ) -> Result<Response, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_success() {
        assert!(Response::new(200, Bytes::new()).is_success());
        assert!(Response::new(204, Bytes::new()).is_success());
        assert!(!Response::new(300, Bytes::new()).is_success());
        assert!(!Response::new(500, Bytes::new()).is_success());
    }

    #[test]
    fn test_response_json() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Answer {
            answer: String,
        }

        let response = Response::new(200, Bytes::from(r#"{"answer":"42"}"#));
        let data: Answer = response.json().unwrap();
        assert_eq!(
            data,
            Answer {
                answer: "42".to_string()
            }
        );
    }

    #[test]
    fn test_error_for_status_keeps_body() {
        let err = Response::new(503, Bytes::from("overloaded"))
            .error_for_status()
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 503,
                body: "overloaded".to_string()
            }
        );

        let ok = Response::new(200, Bytes::from("fine")).error_for_status();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_multipart_form_builder() {
        let form = MultipartForm::new().text("team_key", "t-1").file(FilePart {
            field: "file".to_string(),
            file_name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF"),
        });
        assert_eq!(form.fields, vec![("team_key".to_string(), "t-1".to_string())]);
        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].file_name, "notes.pdf");
    }
}
