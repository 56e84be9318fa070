use std::fmt;

use chrono::{DateTime, Utc};
use mediadrop_protocol::FileStatus;
use mediadrop_transfer::RawFile;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a registry entry, unique for the store's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One file selected for upload and its lifecycle.
///
/// `name`, `byte_size` and `mime_type` are captured from the [`RawFile`] at
/// registration and never change. Everything else is mutated through
/// [`UploadStore`](crate::UploadStore).
#[derive(Debug, Clone, Serialize)]
pub struct TrackedFile {
    id: FileId,
    #[serde(skip)]
    raw_file: RawFile,
    name: String,
    byte_size: u64,
    mime_type: String,
    pub(crate) progress: u8,
    pub(crate) status: FileStatus,
    pub(crate) error_message: Option<String>,
    pub(crate) uploaded_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl TrackedFile {
    pub(crate) fn new(raw_file: RawFile) -> Self {
        Self {
            id: FileId::generate(),
            name: raw_file.name().to_string(),
            byte_size: raw_file.byte_size(),
            mime_type: raw_file.mime_type().to_string(),
            raw_file,
            progress: 0,
            status: FileStatus::Pending,
            error_message: None,
            uploaded_reference: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &FileId {
        &self.id
    }

    /// Handle to the file content; cloning it shares the content.
    pub fn raw_file(&self) -> &RawFile {
        &self.raw_file
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Upload progress, 0-100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// URL or analysis document returned by the server.
    pub fn uploaded_reference(&self) -> Option<&str> {
        self.uploaded_reference.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
