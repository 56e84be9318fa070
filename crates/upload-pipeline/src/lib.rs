//! Upload orchestration.
//!
//! [`UploadPipeline`] validates a tracked file, drives its status through
//! `pending -> uploading -> completed | error` in the [`UploadStore`], hands
//! the content to a [`Transport`] and records the outcome. Per-file failures
//! never escape: they land in the store and in the returned
//! [`UploadResult`].
//!
//! [`UploadStore`]: mediadrop_upload_store::UploadStore
//! [`Transport`]: mediadrop_transport::Transport

mod error;
mod pipeline;
mod types;

pub use error::{PipelineError, UploadError};
pub use pipeline::UploadPipeline;
pub use types::{PipelineConfig, UploadEvent, UploadResult};
