//! HTTP upload surface
//!
//! A single `POST /upload-srs` multipart endpoint: validates the upload,
//! persists it to a temp file, runs the full generation pipeline over it, and
//! returns the final pipeline state as JSON. The temp file is removed when
//! the handler returns on every path.

use anyhow::{Context, Result};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::generator::ExternalGenerator;
use crate::pipeline::run_generation_pipeline;

/// Shared handler state
pub struct AppState {
    pub config: PipelineConfig,
    pub generator: Arc<dyn ExternalGenerator>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload-srs", post(upload_srs))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    println!("🌐 Listening on {}", bind);
    axum::serve(listener, router(state))
        .await
        .context("Server error")?;
    Ok(())
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn upload_srs(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let (filename, bytes) = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => break (filename, bytes),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read uploaded file: {}", e),
                        )
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "No file field in multipart body.".to_string(),
                )
            }
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", e),
                )
            }
        }
    };

    // Validate before anything touches the filesystem
    if !filename.to_lowercase().ends_with(".docx") {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Only .docx files are supported.".to_string(),
        );
    }
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Uploaded .docx file is empty.".to_string(),
        );
    }

    match process_upload(&state, &bytes).await {
        Ok(final_state) => (
            StatusCode::OK,
            Json(json!({
                "message": "SRS processed successfully",
                "result": final_state,
            })),
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error processing SRS: {:#}", e),
        ),
    }
}

/// Persist the upload to a temp `.docx` and run the pipeline over it
///
/// The temp file lives in `config.upload_dir` and is deleted when `temp`
/// drops, whether the pipeline succeeded or not.
async fn process_upload(
    state: &AppState,
    bytes: &[u8],
) -> Result<crate::pipeline::PipelineState> {
    std::fs::create_dir_all(&state.config.upload_dir)
        .with_context(|| format!("Failed to create {}", state.config.upload_dir.display()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("srs_upload_")
        .suffix(".docx")
        .tempfile_in(&state.config.upload_dir)
        .context("Failed to create temp upload file")?;
    temp.write_all(bytes).context("Failed to write upload")?;
    temp.flush().context("Failed to flush upload")?;

    run_generation_pipeline(
        state.config.clone(),
        Arc::clone(&state.generator),
        temp.path(),
    )
    .await
}
