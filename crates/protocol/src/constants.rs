use std::time::Duration;

/// Endpoint for multipart form uploads.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "http://localhost:5231/api/upload";

/// Endpoint for the base64 JSON analysis upload.
pub const DEFAULT_PROCESS_IMAGE_ENDPOINT: &str = "http://localhost:5231/process-image";

/// Multipart field name carrying the file content.
pub const DEFAULT_FIELD_NAME: &str = "file";

/// Maximum accepted file size (2 MiB).
pub const DEFAULT_MAX_BYTE_SIZE: u64 = 2 * 1024 * 1024;

/// MIME patterns accepted by default. A trailing `/*` matches by prefix.
pub const DEFAULT_ALLOWED_MIME_PATTERNS: &[&str] =
    &["image/*", "video/*", "audio/*", "application/pdf", "text/*"];

/// Request timeout for the form strategy.
pub const DEFAULT_FORM_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between consecutive files of a sequential upload.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

/// How long the batch progress indicator lingers after a batch finishes.
pub const DEFAULT_HIDE_PROGRESS_DELAY: Duration = Duration::from_millis(1000);

/// Number of concurrent uploads per chunk in a batch upload.
pub const DEFAULT_CONCURRENCY: usize = 3;
