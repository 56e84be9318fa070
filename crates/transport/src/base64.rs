//! Single-shot base64 JSON strategy.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use mediadrop_protocol::constants::DEFAULT_PROCESS_IMAGE_ENDPOINT;
use mediadrop_protocol::{
    AnalysisMetadata, ProcessImageRequest, UploadResponse, encode_base64, strip_data_uri_prefix,
    to_data_uri,
};
use mediadrop_transfer::{ProgressCallback, RawFile};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{TransferOutcome, Transport, TransportError, http_client, server_error, with_headers};

/// Settings for [`Base64Transport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Base64Config {
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
}

impl Default for Base64Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROCESS_IMAGE_ENDPOINT.to_string(),
            headers: BTreeMap::from([("accept".to_string(), "*/*".to_string())]),
        }
    }
}

/// Reads the whole file, posts it as `{"base64Image": ...}` and expects an
/// envelope carrying `analysisResult`.
///
/// Progress is reported once, as 100, when the analysis arrives. No timeout
/// is applied.
pub struct Base64Transport {
    http: reqwest::Client,
    config: Base64Config,
}

impl Base64Transport {
    pub fn new(config: Base64Config) -> Result<Self, TransportError> {
        Ok(Self {
            http: http_client()?,
            config,
        })
    }

    pub fn config(&self) -> &Base64Config {
        &self.config
    }

    async fn upload(
        &self,
        file: RawFile,
        on_progress: ProgressCallback,
    ) -> Result<TransferOutcome, TransportError> {
        let data = file.read_all().await?;
        let data_uri = to_data_uri(file.mime_type(), &encode_base64(&data));
        let request = ProcessImageRequest {
            base64_image: strip_data_uri_prefix(&data_uri).to_string(),
        };

        debug!(file = file.name(), bytes = data.len(), endpoint = %self.config.endpoint, "sending base64 upload");
        let req = with_headers(
            self.http.post(&self.config.endpoint).json(&request),
            &self.config.headers,
        );
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            return Err(server_error(status.as_u16(), &bytes));
        }

        let response =
            UploadResponse::from_slice(&bytes).map_err(|e| TransportError::Parse(e.to_string()))?;
        let Some(raw) = response.analysis_result.as_deref() else {
            let message = response
                .error
                .clone()
                .unwrap_or_else(|| format!("server error: {}", status.as_u16()));
            return Err(TransportError::Server {
                status: status.as_u16(),
                message,
            });
        };
        let metadata =
            AnalysisMetadata::parse(raw).map_err(|e| TransportError::Parse(e.to_string()))?;

        on_progress(100);
        Ok(TransferOutcome {
            response,
            metadata: Some(metadata),
            display_source: Some(data_uri),
        })
    }
}

impl Transport for Base64Transport {
    fn transfer(
        &self,
        file: RawFile,
        on_progress: ProgressCallback,
    ) -> Pin<Box<dyn Future<Output = Result<TransferOutcome, TransportError>> + Send + '_>> {
        Box::pin(self.upload(file, on_progress))
    }

    fn name(&self) -> &'static str {
        "base64"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mediadrop_protocol::MediaFormat;

    use super::*;
    use crate::test_server::{body_of, refused_url, serve_once};

    fn transport(endpoint: String) -> Base64Transport {
        Base64Transport::new(Base64Config {
            endpoint,
            ..Default::default()
        })
        .unwrap()
    }

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        (Arc::new(move |p| s.lock().unwrap().push(p)), seen)
    }

    fn hello_png() -> RawFile {
        RawFile::from_bytes("hello.png", "image/png", b"Hello".to_vec())
    }

    #[test]
    fn config_defaults() {
        let config = Base64Config::default();
        assert_eq!(config.endpoint, "http://localhost:5231/process-image");
        assert_eq!(config.headers.get("accept").map(String::as_str), Some("*/*"));
    }

    #[tokio::test]
    async fn analysis_result_is_parsed() {
        let body = r#"{"analysisResult":"{\"format\":\"image\",\"tags\":[\"a\"]}"}"#;
        let (url, handle) = serve_once(200, body).await;
        let (cb, seen) = recorder();

        let outcome = transport(url).transfer(hello_png(), cb).await.unwrap();
        let meta = outcome.metadata.unwrap();
        assert_eq!(meta.media_format(), Some(MediaFormat::Image));
        assert_eq!(meta.tags(), ["a".to_string()]);
        assert_eq!(
            outcome.display_source.as_deref(),
            Some("data:image/png;base64,SGVsbG8=")
        );
        assert_eq!(*seen.lock().unwrap(), vec![100]);

        let request = handle.await.unwrap();
        let head = String::from_utf8_lossy(&request).to_ascii_lowercase();
        assert!(head.starts_with("post /upload"));
        assert!(head.contains("content-type: application/json"));
        assert!(head.contains("accept: */*"));
        let sent: serde_json::Value = serde_json::from_slice(body_of(&request)).unwrap();
        assert_eq!(sent, serde_json::json!({"base64Image": "SGVsbG8="}));
    }

    #[tokio::test]
    async fn error_status_carries_server_message() {
        let (url, handle) = serve_once(500, r#"{"error":"analyzer offline"}"#).await;
        let (cb, seen) = recorder();

        let err = transport(url).transfer(hello_png(), cb).await.unwrap_err();
        assert!(matches!(err, TransportError::Server { status: 500, .. }));
        assert_eq!(err.to_string(), "analyzer offline");
        assert!(seen.lock().unwrap().is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn error_status_with_non_json_body_is_generic() {
        let (url, handle) = serve_once(500, "Internal Server Error").await;
        let (cb, _) = recorder();

        let err = transport(url).transfer(hello_png(), cb).await.unwrap_err();
        assert!(err.to_string().contains("500"), "got {err}");
        handle.abort();
    }

    #[tokio::test]
    async fn success_without_analysis_is_server_error() {
        let (url, handle) = serve_once(200, r#"{"error":"nothing recognized"}"#).await;
        let (cb, _) = recorder();

        let err = transport(url).transfer(hello_png(), cb).await.unwrap_err();
        assert!(matches!(err, TransportError::Server { status: 200, .. }));
        assert_eq!(err.to_string(), "nothing recognized");
        handle.abort();
    }

    #[tokio::test]
    async fn malformed_envelope_is_parse_error() {
        let (url, handle) = serve_once(200, "{oops").await;
        let (cb, _) = recorder();

        let err = transport(url).transfer(hello_png(), cb).await.unwrap_err();
        assert!(matches!(err, TransportError::Parse(_)), "got {err:?}");
        handle.abort();
    }

    #[tokio::test]
    async fn malformed_analysis_is_parse_error() {
        let (url, handle) = serve_once(200, r#"{"analysisResult":"not json"}"#).await;
        let (cb, seen) = recorder();

        let err = transport(url).transfer(hello_png(), cb).await.unwrap_err();
        assert!(matches!(err, TransportError::Parse(_)), "got {err:?}");
        assert!(seen.lock().unwrap().is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let (cb, _) = recorder();
        let err = transport(refused_url().await)
            .transfer(hello_png(), cb)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)), "got {err:?}");
        assert!(err.to_string().starts_with("connection error during upload"));
    }

    #[tokio::test]
    async fn missing_disk_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"x").unwrap();
        let file = RawFile::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let (cb, _) = recorder();
        let err = transport(refused_url().await)
            .transfer(file, cb)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Read(_)), "got {err:?}");
    }
}
