//! Multipart form strategy with byte-level progress.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use mediadrop_protocol::UploadResponse;
use mediadrop_protocol::constants::{
    DEFAULT_FIELD_NAME, DEFAULT_FORM_TIMEOUT, DEFAULT_UPLOAD_ENDPOINT,
};
use mediadrop_transfer::{
    ChunkReader, DEFAULT_CHUNK_SIZE, ProgressCallback, ProgressReporter, RawFile,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{TransferOutcome, Transport, TransportError, http_client, server_error, with_headers};

/// HTTP method used for form uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        }
    }
}

/// Settings for [`FormTransport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub endpoint: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    /// Form field carrying the file content.
    pub field_name: String,
    /// Whole-request timeout; `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
    /// Additional form fields. Non-string values are sent JSON-encoded.
    pub extra_fields: serde_json::Map<String, Value>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            method: HttpMethod::Post,
            headers: BTreeMap::new(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            timeout_ms: Some(DEFAULT_FORM_TIMEOUT.as_millis() as u64),
            extra_fields: serde_json::Map::new(),
        }
    }
}

/// Streams the file as a multipart form, reporting progress as request body
/// chunks are handed to the connection.
pub struct FormTransport {
    http: reqwest::Client,
    config: FormConfig,
}

impl FormTransport {
    pub fn new(config: FormConfig) -> Result<Self, TransportError> {
        Ok(Self {
            http: http_client()?,
            config,
        })
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    async fn upload(
        &self,
        file: RawFile,
        on_progress: ProgressCallback,
    ) -> Result<TransferOutcome, TransportError> {
        let data = file.read_all().await?;
        let total = data.len() as u64;
        let reporter = Arc::new(ProgressReporter::new(total, on_progress));

        let body = {
            let reporter = Arc::clone(&reporter);
            let chunks = ChunkReader::new(data, DEFAULT_CHUNK_SIZE).map(move |chunk| {
                reporter.advance(chunk.data.len() as u64);
                Ok::<_, std::io::Error>(chunk.data)
            });
            Body::wrap_stream(futures_util::stream::iter(chunks))
        };

        let part = Part::stream_with_length(body, total)
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())?;
        let mut form = Form::new().part(self.config.field_name.clone(), part);
        for (key, value) in &self.config.extra_fields {
            form = form.text(key.clone(), field_text(value));
        }

        let mut req = self
            .http
            .request(self.config.method.into(), &self.config.endpoint)
            .multipart(form);
        req = with_headers(req, &self.config.headers);
        if let Some(ms) = self.config.timeout_ms {
            req = req.timeout(Duration::from_millis(ms));
        }

        debug!(file = file.name(), bytes = total, endpoint = %self.config.endpoint, "sending form upload");
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            return Err(server_error(status.as_u16(), &bytes));
        }

        let response =
            UploadResponse::from_slice(&bytes).map_err(|e| TransportError::Parse(e.to_string()))?;
        let metadata = response
            .analysis()
            .map_err(|e| TransportError::Parse(e.to_string()))?;
        reporter.finish();

        Ok(TransferOutcome {
            display_source: response.url.clone(),
            response,
            metadata,
        })
    }
}

impl Transport for FormTransport {
    fn transfer(
        &self,
        file: RawFile,
        on_progress: ProgressCallback,
    ) -> Pin<Box<dyn Future<Output = Result<TransferOutcome, TransportError>> + Send + '_>> {
        Box::pin(self.upload(file, on_progress))
    }

    fn name(&self) -> &'static str {
        "form"
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
