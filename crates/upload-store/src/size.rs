const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Renders a byte count as `0 Bytes`, `1.5 KB`, `2 MB`...
///
/// Base 1024, at most two decimals with trailing zeros dropped. Sizes past
/// the GB range stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[unit])
}
