//! Upload endpoint behavior

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use srs_forge::server::router;

use super::common::{cleanup_temp_dir, create_temp_dir, mock_app_state, sample_srs_paragraphs, write_test_docx};

const BOUNDARY: &str = "srs-forge-test-boundary";

/// Build a multipart/form-data body with one `file` field
fn multipart_body(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(filename: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-srs")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, bytes)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_rejects_non_docx_filename() {
    let dir = create_temp_dir("server_ext");
    let app = router(mock_app_state(&dir));

    let response = app
        .oneshot(upload_request("requirements.pdf", b"whatever"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Only .docx files are supported.");
    // Nothing was persisted for a rejected upload
    assert!(!dir.join("temp").exists());

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_rejects_whitespace_only_upload() {
    let dir = create_temp_dir("server_empty");
    let app = router(mock_app_state(&dir));

    let response = app
        .oneshot(upload_request("srs.docx", b"   \n\t  "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Uploaded .docx file is empty.");

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_rejects_body_without_file_field() {
    let dir = create_temp_dir("server_nofield");
    let app = router(mock_app_state(&dir));

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n");
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    let request = Request::builder()
        .method("POST")
        .uri("/upload-srs")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_successful_upload_returns_pipeline_state() {
    let dir = create_temp_dir("server_ok");
    let docx_path = dir.join("upload_source.docx");
    write_test_docx(&docx_path, &sample_srs_paragraphs(), &[]);
    let docx_bytes = std::fs::read(&docx_path).unwrap();

    let app = router(mock_app_state(&dir));
    let response = app
        .oneshot(upload_request("srs.docx", &docx_bytes))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "SRS processed successfully");
    assert_eq!(body["result"]["tests_passed"], true);
    assert!(body["result"]["project_name"]
        .as_str()
        .unwrap()
        .starts_with("fastapi_project_"));

    // The temp upload file was removed once the pipeline finished
    let leftovers: Vec<_> = std::fs::read_dir(dir.join("temp"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .collect();
    assert!(leftovers.is_empty());

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_corrupt_docx_reports_processing_error() {
    let dir = create_temp_dir("server_corrupt");
    let app = router(mock_app_state(&dir));

    // Valid filename, non-empty body, but not a zip container
    let response = app
        .oneshot(upload_request("srs.docx", b"this is not a docx"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error processing SRS:"));

    // The temp upload file is removed on the failure path too
    let leftovers: Vec<_> = std::fs::read_dir(dir.join("temp"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .collect();
    assert!(leftovers.is_empty());

    cleanup_temp_dir(&dir);
}
