//! Transport error types.

use mediadrop_transfer::TransferError;

/// Errors produced while transferring a file.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection error during upload: {0}")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("failed to process the server response: {0}")]
    Parse(String),

    #[error("upload timed out")]
    Timeout,

    #[error("failed to read file: {0}")]
    Read(#[from] TransferError),

    #[error("invalid request: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::Request(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
