//! Human and JSON renderings of an upload run.

use mediadrop_upload_pipeline::UploadResult;
use mediadrop_upload_store::UploadState;
use serde_json::json;

/// One line per result, then the artifacts, then a summary.
pub fn render_text(state: &UploadState, results: &[UploadResult]) -> String {
    let mut out = String::new();

    for result in results {
        let name = state
            .file(&result.file_id)
            .map(|f| f.name().to_string())
            .unwrap_or_else(|| result.file_id.to_string());
        if result.success {
            let reference = state
                .file(&result.file_id)
                .and_then(|f| f.uploaded_reference())
                .filter(|r| r.starts_with("http"))
                .unwrap_or("");
            out.push_str(format!("ok      {name} {reference}").trim_end());
        } else {
            let error = result.error.as_deref().unwrap_or("unknown error");
            out.push_str(&format!("failed  {name}: {error}"));
        }
        out.push('\n');
    }

    for artifact in state.artifacts() {
        out.push_str(&format!(
            "artifact {} [{}]",
            artifact.descriptive_name, artifact.media_format
        ));
        if let Some(dims) = artifact.dimensions
            && let (Some(w), Some(h)) = (dims.width, dims.height)
        {
            out.push_str(&format!(" {w}x{h}"));
        }
        if !artifact.tags.is_empty() {
            out.push_str(&format!(" tags: {}", artifact.tags.join(", ")));
        }
        if let Some(author) = &artifact.author {
            out.push_str(&format!(" by {author}"));
        }
        if artifact.uncertain {
            out.push_str(" (uncertain)");
        }
        out.push('\n');
    }

    let stats = state.stats();
    out.push_str(&format!(
        "{}/{} uploaded ({} of {}), {} failed\n",
        stats.completed, stats.total, stats.uploaded_size, stats.total_size, stats.errors
    ));
    out
}

/// Everything in one JSON document.
pub fn render_json(state: &UploadState, results: &[UploadResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "results": results,
        "files": state.files(),
        "artifacts": state.artifacts(),
        "stats": state.stats(),
    }))
}
