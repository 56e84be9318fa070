//! Base64 and data-URI helpers for the single-shot image upload.

use base64::{Engine, engine::general_purpose::STANDARD};

/// Encodes raw bytes as standard (padded) base64.
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Builds a `data:<mime>;base64,<payload>` URI.
pub fn to_data_uri(mime_type: &str, base64: &str) -> String {
    format!("data:{mime_type};base64,{base64}")
}

/// Returns the base64 payload of a data URI, or the input unchanged when it
/// carries no `data:` prefix.
pub fn strip_data_uri_prefix(value: &str) -> &str {
    if !value.starts_with("data:") {
        return value;
    }
    match value.split_once(',') {
        Some((_, payload)) => payload,
        None => "",
    }
}
