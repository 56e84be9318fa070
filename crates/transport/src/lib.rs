//! Upload strategies.
//!
//! A [`Transport`] moves one [`RawFile`] to the server and resolves to a
//! normalized [`TransferOutcome`]. Two strategies are provided:
//! [`FormTransport`] streams a multipart body and reports byte progress,
//! [`Base64Transport`] posts the whole file as a base64 JSON document and
//! reports only completion.

mod base64;
mod error;
mod form;
#[cfg(test)]
mod test_server;

use std::future::Future;
use std::pin::Pin;

use mediadrop_protocol::{AnalysisMetadata, UploadResponse};
use mediadrop_transfer::{ProgressCallback, RawFile};

pub use crate::base64::{Base64Config, Base64Transport};
pub use error::TransportError;
pub use form::{FormConfig, FormTransport, HttpMethod};

/// Normalized result of a successful transfer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferOutcome {
    /// The decoded response envelope.
    pub response: UploadResponse,
    /// Parsed analysis document, when the server returned one.
    pub metadata: Option<AnalysisMetadata>,
    /// Data URI or remote URL to display the uploaded content.
    pub display_source: Option<String>,
}

impl TransferOutcome {
    /// Server-provided reference for the upload: the URL if any, else the raw
    /// analysis document.
    pub fn reference(&self) -> Option<&str> {
        self.response
            .url
            .as_deref()
            .or(self.response.analysis_result.as_deref())
    }
}

/// A strategy for transferring one file to the upload endpoint.
///
/// Implementations report integer percentages through `on_progress`.
/// Dropping the returned future aborts the transfer.
pub trait Transport: Send + Sync {
    fn transfer(
        &self,
        file: RawFile,
        on_progress: ProgressCallback,
    ) -> Pin<Box<dyn Future<Output = Result<TransferOutcome, TransportError>> + Send + '_>>;

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Builds the shared HTTP client.
pub(crate) fn http_client() -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| TransportError::Request(e.to_string()))
}

/// Applies configured headers to a request.
pub(crate) fn with_headers<'a>(
    mut req: reqwest::RequestBuilder,
    headers: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        req = req.header(name.as_str(), value.as_str());
    }
    req
}

/// Turns a non-2xx response body into a [`TransportError::Server`].
///
/// The envelope's `error` field is used when the body parses; otherwise the
/// generic `server error: <status>` message.
pub(crate) fn server_error(status: u16, body: &[u8]) -> TransportError {
    let message = UploadResponse::from_slice(body)
        .ok()
        .and_then(|r| r.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("server error: {status}"));
    TransportError::Server { status, message }
}
