//! File handles, validation, chunking and progress reporting for uploads.

mod chunked;
mod progress;
mod types;
mod validation;

pub use chunked::ChunkReader;
pub use progress::{ProgressCallback, ProgressReporter, percent_of};
pub use types::{Chunk, RawFile, detect_content_type};
pub use validation::{ValidationConfig, ValidationError, validate_file};

/// Default chunk size for streamed request bodies: 64 KiB.
///
/// Each chunk handed to the HTTP client produces at most one progress tick.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// MIME type used when the extension is not recognized.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid validation config: {0}")]
    InvalidConfig(String),
}
