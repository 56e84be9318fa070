fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use mediadrop_protocol::{
        AnalysisMetadata, Dimensions, FileStatus, MediaFormat, ProcessImageRequest,
        UploadResponse,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  server: {fixture}\n  client: {reserialized}"
        );
        parsed
    }

    // --- Requests ---

    #[test]
    fn fixture_process_image_request() {
        let req: ProcessImageRequest = roundtrip_test("process_image_request.json");
        assert!(!req.base64_image.starts_with("data:"));
    }

    // --- Response envelopes ---

    #[test]
    fn fixture_upload_response_success() {
        let resp: UploadResponse = roundtrip_test("upload_response_success.json");
        assert_eq!(resp.success, Some(true));

        let meta = resp.analysis().unwrap().expect("analysis present");
        assert_eq!(meta.name.as_deref(), Some("Mountain lake"));
        assert_eq!(meta.media_format(), Some(MediaFormat::Image));
        assert_eq!(meta.tags(), ["lake", "mountain", "landscape"]);
        assert!(!meta.is_uncertain());
        assert_eq!(
            meta.dimensions(),
            Some(Dimensions {
                width: Some(4000),
                height: Some(3000)
            })
        );
    }

    #[test]
    fn fixture_upload_response_url() {
        let resp: UploadResponse = roundtrip_test("upload_response_url.json");
        assert_eq!(
            resp.url.as_deref(),
            Some("https://cdn.mediadrop.test/uploads/2024/05/lake.png")
        );
        assert!(resp.analysis().unwrap().is_none());
    }

    #[test]
    fn fixture_upload_response_error() {
        let resp: UploadResponse = roundtrip_test("upload_response_error.json");
        assert_eq!(resp.error.as_deref(), Some("Unsupported image encoding"));
        assert_eq!(resp.success, Some(false));
    }

    #[test]
    fn upload_response_raw_bytes_match_value_parse() {
        let raw = read_fixture("upload_response_success.json");
        let from_bytes = UploadResponse::from_slice(raw.as_bytes()).unwrap();
        let from_value: UploadResponse =
            serde_json::from_value(load_fixture("upload_response_success.json")).unwrap();
        assert_eq!(from_bytes, from_value);
    }

    // --- Analysis documents ---

    #[test]
    fn fixture_analysis_metadata() {
        let meta: AnalysisMetadata = roundtrip_test("analysis_metadata.json");
        assert_eq!(meta.media_format(), Some(MediaFormat::Illustration));
        assert_eq!(meta.author.as_deref(), Some("Studio Nube"));
        assert_eq!(meta.upload_date.as_deref(), Some("2024-01-15T12:00:00Z"));
        assert!(meta.is_uncertain());
    }

    #[test]
    fn fixture_analysis_metadata_flat_dimensions() {
        // Explicit nulls are not re-emitted, so compare fields instead of a roundtrip.
        let meta = AnalysisMetadata::parse(&read_fixture("analysis_metadata_flat.json")).unwrap();
        assert_eq!(meta.media_format(), Some(MediaFormat::ThreeD));
        assert!(meta.tags().is_empty());
        assert!(!meta.is_uncertain());
        assert_eq!(
            meta.dimensions(),
            Some(Dimensions {
                width: Some(512),
                height: Some(512)
            })
        );
    }

    // --- Enums ---

    #[test]
    fn fixture_file_status_values() {
        let statuses: Vec<FileStatus> = roundtrip_test("file_status.json");
        assert_eq!(
            statuses,
            [
                FileStatus::Pending,
                FileStatus::Uploading,
                FileStatus::Completed,
                FileStatus::Error
            ]
        );
    }

    #[test]
    fn media_format_wire_names() {
        for (wire, format) in [
            ("image", MediaFormat::Image),
            ("video", MediaFormat::Video),
            ("illustration", MediaFormat::Illustration),
            ("3D", MediaFormat::ThreeD),
            ("unknown", MediaFormat::Unknown),
        ] {
            let json = serde_json::to_value(format).unwrap();
            assert_eq!(json, serde_json::json!(wire));
            assert_eq!(MediaFormat::parse(wire), format);
        }
    }
}
