//! Document pipeline calls.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::{BackendClient, DOCUMENT_CHAT_PATH, DOCUMENT_UPLOAD_PATH};
use crate::error::{ChatError, ProtocolError, TransportError};
use crate::models::{
    DocumentAnswer, DocumentContent, DocumentQuery, DocumentUpload, Report, ReportRequest,
    UploadResponse,
};
use crate::traits::{FilePart, MultipartForm, Response};

fn document_path(document_id: &str, action: &str) -> String {
    format!(
        "/api/documents/{}/{}",
        urlencoding::encode(document_id),
        action
    )
}

fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ChatError> {
    let response = response.error_for_status()?;
    response.json().map_err(|e| {
        ProtocolError::MalformedPayload {
            payload: String::from_utf8_lossy(&response.body).into_owned(),
            message: e.to_string(),
        }
        .into()
    })
}

impl BackendClient {
    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ChatError> {
        let body = serde_json::to_string(body)
            .map_err(|e| TransportError::Other(format!("Failed to encode request: {}", e)))?;
        let response = self
            .http
            .post(&self.url(path), &body, &self.json_headers())
            .await?;
        parse(response)
    }

    /// Upload a file as `multipart/form-data` with fields `file` and
    /// `team_key`.
    pub async fn upload_document(
        &self,
        upload: DocumentUpload,
        team_key: &str,
    ) -> Result<UploadResponse, ChatError> {
        tracing::debug!(file = %upload.file_name, bytes = upload.bytes.len(), "Uploading document");

        let form = MultipartForm::new()
            .file(FilePart {
                field: "file".to_string(),
                file_name: upload.file_name,
                mime_type: upload.mime_type,
                bytes: Bytes::from(upload.bytes),
            })
            .text("team_key", team_key);

        let response = self
            .http
            .post_multipart(&self.url(DOCUMENT_UPLOAD_PATH), form, &self.headers())
            .await?;
        parse(response)
    }

    /// Fetch the extracted text of an uploaded document.
    pub async fn document_content(&self, document_id: &str) -> Result<DocumentContent, ChatError> {
        let url = self.url(&document_path(document_id, "content"));
        let response = self.http.get(&url, &self.headers()).await?;
        parse(response)
    }

    pub async fn generate_report(
        &self,
        document_id: &str,
        content: &str,
    ) -> Result<Report, ChatError> {
        let request = ReportRequest {
            document_id: document_id.to_string(),
            content: content.to_string(),
        };
        self.post_json(&document_path(document_id, "report"), &request)
            .await
    }

    /// Ask a question against the uploaded documents.
    ///
    /// `top_k` bounds how many passages the backend retrieves.
    pub async fn query_documents(&self, query: &str, top_k: u32) -> Result<DocumentAnswer, ChatError> {
        let request = DocumentQuery {
            query: query.to_string(),
            top_k,
        };
        self.post_json(DOCUMENT_CHAT_PATH, &request).await
    }
}
