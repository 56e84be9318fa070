use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{FALLBACK_CONTENT_TYPE, TransferError};

/// A chunk of file data for a streamed request body.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

#[derive(Clone)]
enum FileSource {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// Handle to the binary content of a file chosen for upload.
///
/// `name`, `byte_size` and `mime_type` are captured once when the handle is
/// created. Cloning is cheap: in-memory content is shared, on-disk content is
/// only read when [`read_all`](Self::read_all) is called.
#[derive(Clone)]
pub struct RawFile {
    name: String,
    mime_type: String,
    byte_size: u64,
    source: FileSource,
}

impl RawFile {
    /// Wraps in-memory content.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            byte_size: data.len() as u64,
            source: FileSource::Memory(data),
        }
    }

    /// Opens a file on disk, capturing its size and guessing its MIME type
    /// from the extension.
    pub fn from_path(path: &Path) -> Result<Self, TransferError> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(TransferError::InvalidPath(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TransferError::InvalidPath(format!("no file name: {}", path.display())))?;
        let mime_type = detect_content_type(&name).unwrap_or(FALLBACK_CONTENT_TYPE);

        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            byte_size: metadata.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    /// Overrides the display name (e.g. a path relative to a scanned root).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Path of the backing file, for disk-backed handles.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Disk(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// Reads the whole content into memory.
    pub async fn read_all(&self) -> Result<Arc<[u8]>, TransferError> {
        match &self.source {
            FileSource::Memory(data) => Ok(Arc::clone(data)),
            FileSource::Disk(path) => {
                let data = tokio::fs::read(path).await?;
                Ok(data.into())
            }
        }
    }
}

impl fmt::Debug for RawFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            FileSource::Memory(_) => "memory".to_string(),
            FileSource::Disk(path) => path.display().to_string(),
        };
        f.debug_struct("RawFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("byte_size", &self.byte_size)
            .field("source", &source)
            .finish()
    }
}

/// Detects a MIME type from a file name's extension (case-insensitive).
pub fn detect_content_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("ico") => Some("image/x-icon"),
        Some("bmp") => Some("image/bmp"),
        Some("svg") => Some("image/svg+xml"),
        Some("mp4") => Some("video/mp4"),
        Some("webm") => Some("video/webm"),
        Some("mov") => Some("video/quicktime"),
        Some("mp3") => Some("audio/mpeg"),
        Some("wav") => Some("audio/wav"),
        Some("pdf") => Some("application/pdf"),
        Some("txt") => Some("text/plain"),
        Some("json") => Some("application/json"),
        _ => None,
    }
}
