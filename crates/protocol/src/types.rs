use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a file selected for upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "error")]
    Error,
}

impl FileStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Uploading => "uploading",
            FileStatus::Completed => "completed",
            FileStatus::Error => "error",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media kind reported by the analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "illustration")]
    Illustration,
    #[serde(rename = "3D")]
    ThreeD,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl MediaFormat {
    /// Wire name of the format.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaFormat::Image => "image",
            MediaFormat::Video => "video",
            MediaFormat::Illustration => "illustration",
            MediaFormat::ThreeD => "3D",
            MediaFormat::Unknown => "unknown",
        }
    }

    /// Maps an analyzer format string to a known format, case-insensitively.
    ///
    /// Anything unrecognized becomes [`MediaFormat::Unknown`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => MediaFormat::Image,
            "video" => MediaFormat::Video,
            "illustration" => MediaFormat::Illustration,
            "3d" => MediaFormat::ThreeD,
            _ => MediaFormat::Unknown,
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions of an analyzed artifact. Either side may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Dimensions {
    /// Returns `None` when neither side is known.
    pub fn from_parts(width: Option<u32>, height: Option<u32>) -> Option<Self> {
        if width.is_none() && height.is_none() {
            None
        } else {
            Some(Self { width, height })
        }
    }
}
