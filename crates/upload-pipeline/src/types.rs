//! Data types for the upload flow.

use std::num::NonZeroUsize;
use std::time::Duration;

use mediadrop_protocol::UploadResponse;
use mediadrop_protocol::constants::{
    DEFAULT_BATCH_DELAY, DEFAULT_CONCURRENCY, DEFAULT_HIDE_PROGRESS_DELAY,
};
use mediadrop_transfer::ValidationConfig;
use mediadrop_upload_store::FileId;
use serde::Serialize;

use crate::UploadError;

/// Tuning for [`UploadPipeline`](crate::UploadPipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub validation: ValidationConfig,
    /// Pause between files of a sequential upload.
    pub batch_delay: Duration,
    /// How long the batch progress flag stays up after a batch ends.
    pub hide_progress_delay: Duration,
    /// Files uploaded at once per batch chunk.
    pub concurrency: NonZeroUsize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            batch_delay: DEFAULT_BATCH_DELAY,
            hide_progress_delay: DEFAULT_HIDE_PROGRESS_DELAY,
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Outcome of one upload attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    pub file_id: FileId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<UploadResponse>,
}

impl UploadResult {
    pub(crate) fn from_result(file_id: &FileId, result: Result<UploadResponse, UploadError>) -> Self {
        match result {
            Ok(response) => Self {
                file_id: file_id.clone(),
                success: true,
                error: None,
                response: Some(response),
            },
            Err(e) => Self {
                file_id: file_id.clone(),
                success: false,
                error: Some(e.to_string()),
                response: None,
            },
        }
    }
}

/// Lifecycle notification published by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// A retry put the file back to pending.
    Reset { file_id: FileId },
    Started { file_id: FileId },
    Progress { file_id: FileId, percent: u8 },
    Completed { file_id: FileId },
    Failed { file_id: FileId, error: String },
    Cancelled { file_id: FileId },
}

impl UploadEvent {
    pub fn file_id(&self) -> &FileId {
        match self {
            UploadEvent::Reset { file_id }
            | UploadEvent::Started { file_id }
            | UploadEvent::Progress { file_id, .. }
            | UploadEvent::Completed { file_id }
            | UploadEvent::Failed { file_id, .. }
            | UploadEvent::Cancelled { file_id } => file_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.batch_delay, Duration::from_millis(500));
        assert_eq!(config.hide_progress_delay, Duration::from_millis(1000));
        assert_eq!(config.concurrency.get(), 3);
    }

    #[test]
    fn result_from_error_carries_message() {
        let id = FileId::from("x");
        let result = UploadResult::from_result(&id, Err(UploadError::NotFound(id.clone())));
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("file with ID x not found"));
        assert!(result.response.is_none());
    }
}
