//! Wire protocol types for the MediaDrop upload endpoint.
//!
//! The endpoint accepts either a multipart form upload or a JSON body
//! `{"base64Image": "..."}` and answers with an [`UploadResponse`] envelope.
//! On success the envelope's `analysisResult` holds a JSON-encoded
//! [`AnalysisMetadata`] document.

pub mod constants;
pub mod image;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use image::{encode_base64, strip_data_uri_prefix, to_data_uri};
pub use messages::{AnalysisMetadata, ProcessImageRequest, SizeHint, UploadResponse};
pub use types::{Dimensions, FileStatus, MediaFormat};

/// Errors produced while decoding protocol payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty analysis result")]
    EmptyAnalysis,
}
