use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::types::{Dimensions, MediaFormat};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Body of the single-shot base64 analysis upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageRequest {
    /// Base64 payload without any `data:` prefix.
    pub base64_image: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response envelope shared by both upload strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// JSON-encoded [`AnalysisMetadata`] document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl UploadResponse {
    /// Decodes an envelope from a raw response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Parses the embedded analysis document, if present.
    pub fn analysis(&self) -> Result<Option<AnalysisMetadata>, ProtocolError> {
        match self.analysis_result.as_deref() {
            Some(raw) => AnalysisMetadata::parse(raw).map(Some),
            None => Ok(None),
        }
    }
}

/// `size` object inside the analysis document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeHint {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Metadata produced by the image analyzer.
///
/// Every field is optional; analyzers omit what they cannot determine.
/// Dimensions may appear either nested under `size` or as top-level
/// `width`/`height`; the nested form wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl AnalysisMetadata {
    /// Parses the JSON string carried in `analysisResult`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.trim().is_empty() {
            return Err(ProtocolError::EmptyAnalysis);
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Tags in analyzer order; empty when absent or `null`.
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    /// Whether the analyzer flagged its own answer as unreliable.
    pub fn is_uncertain(&self) -> bool {
        self.uncertain.unwrap_or(false)
    }

    /// The reported format, or `None` when the analyzer gave none.
    pub fn media_format(&self) -> Option<MediaFormat> {
        self.format.as_deref().map(MediaFormat::parse)
    }

    /// Resolved dimensions, preferring the nested `size` object.
    pub fn dimensions(&self) -> Option<Dimensions> {
        let nested = self.size.unwrap_or_default();
        Dimensions::from_parts(
            nested.width.or(self.width),
            nested.height.or(self.height),
        )
    }
}
