use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mediadrop_protocol::{AnalysisMetadata, Dimensions, MediaFormat};
use serde::Serialize;

use crate::FileId;

/// Analyzer-derived record created after a successful analysis upload.
///
/// Never mutated after creation. `source_file_id` is a lookup key only: the
/// tracked file may be removed while the artifact lives on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedArtifact {
    pub source_file_id: FileId,
    pub descriptive_name: String,
    pub media_format: MediaFormat,
    pub dimensions: Option<Dimensions>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub upload_date: Option<DateTime<Utc>>,
    pub uncertain: bool,
    /// Data URI or remote URL of the uploaded content.
    pub display_source: Option<String>,
}

impl UploadedArtifact {
    /// Builds an artifact from analysis metadata.
    ///
    /// Returns `None` when the analyzer reported no format or an empty one.
    /// `fallback_name` is used when the analyzer gave no name.
    pub fn from_metadata(
        source_file_id: FileId,
        fallback_name: &str,
        meta: &AnalysisMetadata,
        display_source: Option<String>,
    ) -> Option<Self> {
        let media_format = meta
            .format
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(MediaFormat::parse)?;
        Some(Self {
            source_file_id,
            descriptive_name: meta
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| fallback_name.to_string()),
            media_format,
            dimensions: meta.dimensions(),
            tags: meta.tags().to_vec(),
            author: meta.author.clone(),
            created_date: meta.date.as_deref().and_then(parse_date),
            upload_date: meta.upload_date.as_deref().and_then(parse_date),
            uncertain: meta.is_uncertain(),
            display_source,
        })
    }
}

/// Accepts RFC 3339, a bare `YYYY-MM-DD` date, or a naive `YYYY-MM-DDTHH:MM:SS`.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}
