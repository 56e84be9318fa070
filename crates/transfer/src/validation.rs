use serde::{Deserialize, Serialize};

use mediadrop_protocol::constants::{DEFAULT_ALLOWED_MIME_PATTERNS, DEFAULT_MAX_BYTE_SIZE};

use crate::{RawFile, TransferError};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size and type constraints checked before any transfer starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum accepted size in bytes; `None` disables the check.
    pub max_byte_size: Option<u64>,
    /// Accepted MIME patterns. `type/*` matches by prefix, anything else by
    /// equality. An empty list accepts every type.
    pub allowed_mime_patterns: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_byte_size: Some(DEFAULT_MAX_BYTE_SIZE),
            allowed_mime_patterns: DEFAULT_ALLOWED_MIME_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl ValidationConfig {
    /// Rejects configurations that can never be satisfied or are malformed.
    ///
    /// A zero size limit and patterns without a `/` are programmer errors.
    pub fn check(&self) -> Result<(), TransferError> {
        if self.max_byte_size == Some(0) {
            return Err(TransferError::InvalidConfig(
                "max_byte_size must be greater than zero".into(),
            ));
        }
        for pattern in &self.allowed_mime_patterns {
            if !pattern.contains('/') {
                return Err(TransferError::InvalidConfig(format!(
                    "MIME pattern must look like type/subtype: {pattern:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Why a file was rejected before upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file is too large. Maximum allowed size: {}MB", format_mb(.max_bytes))]
    TooLarge { max_bytes: u64 },

    #[error("file type not allowed. Allowed types: {}", .allowed.join(", "))]
    TypeNotAllowed { allowed: Vec<String> },
}

/// Checks a file against the configured constraints.
///
/// Size is checked first, then the MIME type. Pure: no side effects.
pub fn validate_file(file: &RawFile, config: &ValidationConfig) -> Result<(), ValidationError> {
    if let Some(max_bytes) = config.max_byte_size
        && file.byte_size() > max_bytes
    {
        return Err(ValidationError::TooLarge { max_bytes });
    }

    if !config.allowed_mime_patterns.is_empty()
        && !config
            .allowed_mime_patterns
            .iter()
            .any(|pattern| mime_matches(pattern, file.mime_type()))
    {
        return Err(ValidationError::TypeNotAllowed {
            allowed: config.allowed_mime_patterns.clone(),
        });
    }

    Ok(())
}

fn format_mb(bytes: &u64) -> String {
    format!("{:.2}", *bytes as f64 / BYTES_PER_MB)
}

fn mime_matches(pattern: &str, mime_type: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(base) => mime_type
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/')),
        None => mime_type == pattern,
    }
}
