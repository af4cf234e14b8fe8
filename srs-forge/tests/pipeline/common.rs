//! Common test utilities for pipeline tests

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use srs_forge::config::PipelineConfig;
use srs_forge::generator::MockGenerator;
use srs_forge::server::AppState;

/// Create a temporary directory for testing
pub fn create_temp_dir(name: &str) -> PathBuf {
    let temp_dir = std::env::temp_dir().join(format!(
        "srs_forge_test_{}_{}",
        name,
        uuid::Uuid::new_v4().simple()
    ));
    std::fs::create_dir_all(&temp_dir).unwrap();
    temp_dir
}

/// Clean up temporary directory
pub fn cleanup_temp_dir(path: &PathBuf) {
    if path.exists() {
        std::fs::remove_dir_all(path).ok();
    }
}

/// Build a minimal .docx container on disk
pub fn write_test_docx(path: &Path, paragraphs: &[&str], images: &[&[u8]]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options: zip::write::FileOptions<'_, ()> =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document><w:body>{}</w:body></w:document>",
        body
    );
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(xml.as_bytes()).unwrap();

    for (idx, image) in images.iter().enumerate() {
        writer
            .start_file(format!("word/media/image{}.png", idx + 1), options)
            .unwrap();
        writer.write_all(image).unwrap();
    }
    writer.finish().unwrap();
}

/// Sample SRS paragraphs matching the mock generator's canned extraction
pub fn sample_srs_paragraphs() -> Vec<&'static str> {
    vec![
        "Software Requirements Specification",
        "The system SHALL expose GET /users to retrieve all users.",
        "The system SHALL expose POST /users/{id} to update one user.",
        "Users must be filtered by active status.",
        "All routes require JWT authentication with admin and user roles.",
    ]
}

/// Write a sample SRS document under `dir` and return its path
pub fn write_sample_srs(dir: &Path) -> PathBuf {
    let path = dir.join("srs.docx");
    write_test_docx(&path, &sample_srs_paragraphs(), &[]);
    path
}

/// Config rooted at `base_dir` with a single attempt and serial generation
pub fn test_config(base_dir: &Path) -> PipelineConfig {
    PipelineConfig::with_base_dir(base_dir)
}

/// App state backed by the mock generator
pub fn mock_app_state(base_dir: &Path) -> Arc<AppState> {
    Arc::new(AppState {
        config: test_config(base_dir),
        generator: Arc::new(MockGenerator::default()),
    })
}
