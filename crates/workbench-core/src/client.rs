use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::mode::Mode;
use crate::models::{ChatRequest, ChatResponse, ErrorBody, IngestResponse};

/// HTTP client for the RAG backend (`/ingest`, `/chat/simple`, `/chat/agentic`)
#[derive(Clone)]
pub struct RagClient {
    client: Client,
    base_url: String,
}

impl RagClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a document as multipart field `file`
    pub async fn ingest(&self, path: &Path) -> Result<IngestResponse, ApiError> {
        let url = format!("{}/ingest", self.base_url);

        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        info!(file = %filename, bytes = bytes.len(), "uploading document");

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime_for(path))?;
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        decode(response).await
    }

    /// Send one query to the endpoint of `mode`
    pub async fn chat(&self, mode: Mode, query: &str) -> Result<ChatResponse, ApiError> {
        let url = format!("{}{}", self.base_url, mode.endpoint());

        info!(mode = mode.as_str(), "sending chat query");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { query })
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;
    debug!(%status, len = body.len(), "backend responded");

    if !status.is_success() {
        let detail = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_detail);
        return Err(ApiError::Server { status, detail });
    }

    serde_json::from_slice(&body).map_err(|e| ApiError::Malformed(e.to_string()))
}

fn mime_for(path: &Path) -> &'static str {
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}
