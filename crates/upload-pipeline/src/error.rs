//! Pipeline error types.

use mediadrop_transfer::ValidationError;
use mediadrop_transport::TransportError;
use mediadrop_upload_store::FileId;

/// Why a single upload did not complete.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("file with ID {0} not found")]
    NotFound(FileId),

    #[error("upload cancelled")]
    Cancelled,

    #[error("file with ID {0} is already uploading")]
    AlreadyUploading(FileId),
}

/// Misconfiguration detected when building a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),
}
