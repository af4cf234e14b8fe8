//! End-to-end pipeline runs with the mock generator

use std::io::Read;
use std::sync::Arc;

use srs_forge::artifact::ArtifactStore;
use srs_forge::generator::MockGenerator;
use srs_forge::pipeline::{keys, run_generation_pipeline};
use srs_forge::workspace::ProjectWorkspace;

use super::common::{cleanup_temp_dir, create_temp_dir, test_config, write_sample_srs, write_test_docx};

#[tokio::test]
async fn test_full_run_produces_verified_project_and_zip() {
    let dir = create_temp_dir("full_run");
    let srs = write_sample_srs(&dir);
    let config = test_config(&dir);

    let state = run_generation_pipeline(config.clone(), Arc::new(MockGenerator::default()), &srs)
        .await
        .unwrap();

    assert_eq!(state.get_bool(keys::TESTS_PASSED), Some(true));
    let name = state.get_str(keys::PROJECT_NAME).unwrap();
    assert!(name.starts_with("fastapi_project_"));

    // The mock extraction has endpoints /users and /users/{id}, table users, JWT auth
    let handle = state.project_handle().unwrap();
    for file in [
        ".env",
        "requirements.txt",
        "README.md",
        "app/main.py",
        "app/database.py",
        "app/api/routes/users.py",
        "app/api/routes/users_id.py",
        "app/services/users_service.py",
        "app/services/users_id_service.py",
        "app/models/users.py",
        "app/auth.py",
        "tests/test_users.py",
        "tests/test_users_id.py",
        "tests/test_db_users.py",
        "tests/test_auth.py",
    ] {
        assert!(handle.join(file).is_file(), "missing {}", file);
    }

    let env_body = std::fs::read_to_string(handle.join(".env")).unwrap();
    assert!(env_body.contains("DATABASE_URL=postgresql://postgres:"));

    // Zip archive sits next to the project dir and contains the scaffolded app
    let zip_path = std::path::PathBuf::from(state.get_str(keys::ZIP_FILE).unwrap());
    assert_eq!(zip_path, config.projects_dir.join(format!("{}.zip", name)));
    let mut archive = zip::ZipArchive::new(std::fs::File::open(&zip_path).unwrap()).unwrap();
    let mut main_py = String::new();
    archive
        .by_name("app/main.py")
        .unwrap()
        .read_to_string(&mut main_py)
        .unwrap();
    assert!(main_py.contains("FastAPI"));

    // Exactly one extraction record was appended
    let records = ArtifactStore::new(&config.artifact_log).load_all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].api_endpoints.len(), 2);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_sequential_runs_append_records_and_latest_moves_forward() {
    let dir = create_temp_dir("sequential");
    let srs = write_sample_srs(&dir);
    let config = test_config(&dir);

    let first = run_generation_pipeline(config.clone(), Arc::new(MockGenerator::default()), &srs)
        .await
        .unwrap();
    let second = run_generation_pipeline(config.clone(), Arc::new(MockGenerator::default()), &srs)
        .await
        .unwrap();

    let first_name = first.get_str(keys::PROJECT_NAME).unwrap();
    let second_name = second.get_str(keys::PROJECT_NAME).unwrap();
    assert_ne!(first_name, second_name);

    // Latest-directory discovery now resolves to the second run's project
    let latest = ProjectWorkspace::new(&config.projects_dir).latest().unwrap();
    assert_eq!(latest.name, second_name);

    let records = ArtifactStore::new(&config.artifact_log).load_all();
    assert_eq!(records.len(), 2);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_vision_fallback_fills_schema_from_embedded_diagram() {
    let dir = create_temp_dir("vision");
    let srs = dir.join("srs.docx");
    write_test_docx(
        &srs,
        &["The system SHALL track sessions per the attached schema diagram."],
        &[b"fake-png-bytes"],
    );

    // Text extraction yields no tables, so the schema comes from the diagram
    let generator = MockGenerator {
        spec_json: r#"{
            "api_endpoints": [
                {"method": "GET", "path": "/sessions", "description": "List sessions", "parameters": []}
            ],
            "backend_logic": [],
            "database_schema": {"tables": {}},
            "authentication": {"type": "", "roles": [], "rules": []}
        }"#
        .to_string(),
        ..MockGenerator::default()
    };

    let config = test_config(&dir);
    let state = run_generation_pipeline(config.clone(), Arc::new(generator), &srs)
        .await
        .unwrap();

    assert_eq!(state.get_bool(keys::TESTS_PASSED), Some(true));
    let spec = state.parsed_spec().unwrap();
    assert!(spec.database_schema.tables.contains_key("sessions"));

    let handle = state.project_handle().unwrap();
    assert!(handle.join("app/models/sessions.py").is_file());
    assert!(handle.join("tests/test_db_sessions.py").is_file());
    // No auth was extracted, so no auth handler is generated
    assert!(!handle.join("app/auth.py").exists());

    cleanup_temp_dir(&dir);
}
