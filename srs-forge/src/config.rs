//! Pipeline configuration
//!
//! One explicit configuration object, loaded from the environment at startup
//! and passed into the orchestrator and every stage that needs it. Nothing in
//! this crate reads the environment after construction.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// API key for the hosted model
    pub api_key: String,
    /// Base URL of the OpenAI-compatible chat completions API
    pub api_base: String,
    /// Model used for text completions
    pub text_model: String,
    /// Model used for vision completions (schema diagrams)
    pub vision_model: String,
    /// Sampling temperature for all completions
    pub temperature: f32,
    /// Directory under which `fastapi_project_<timestamp>` dirs are created
    pub projects_dir: PathBuf,
    /// Path of the append-only extraction log
    pub artifact_log: PathBuf,
    /// Directory for temporary upload files
    pub upload_dir: PathBuf,
    /// Database user written into generated project config
    pub db_user: String,
    /// Database name written into generated project config
    pub db_name: String,
    /// Max concurrent generation tasks within a stage (1 = serial)
    pub batch_size: usize,
    /// Max full-sequence attempts before the run fails terminally
    pub max_attempts: usize,
}

impl PipelineConfig {
    /// Load configuration from the environment (reads `.env` if present)
    ///
    /// `GROQ_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_key = std::env::var("GROQ_API_KEY")
            .context("GROQ_API_KEY is not set (put it in the environment or a .env file)")?;

        let base_dir = std::env::var("SRS_FORGE_DIR")
            .map(PathBuf::from)
            .or_else(|_| std::env::current_dir())
            .context("Failed to resolve working directory")?;

        let mut config = Self::with_base_dir(&base_dir);
        config.api_key = api_key;

        if let Ok(base) = std::env::var("GROQ_API_BASE") {
            config.api_base = base;
        }
        if let Ok(model) = std::env::var("SRS_FORGE_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Ok(model) = std::env::var("SRS_FORGE_VISION_MODEL") {
            config.vision_model = model;
        }
        if let Ok(size) = std::env::var("SRS_FORGE_BATCH_SIZE") {
            config.batch_size = size
                .parse()
                .context("SRS_FORGE_BATCH_SIZE must be a positive integer")?;
        }
        if let Ok(attempts) = std::env::var("SRS_FORGE_MAX_ATTEMPTS") {
            config.max_attempts = attempts
                .parse()
                .context("SRS_FORGE_MAX_ATTEMPTS must be a positive integer")?;
        }

        Ok(config)
    }

    /// Build a configuration rooted at `base_dir` with defaults everywhere else
    ///
    /// The API key is left empty; callers that talk to the real model must
    /// fill it in (tests use a mock generator and never need it).
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            text_model: "llama3-70b-8192".to_string(),
            vision_model: "llama3-vision-70b".to_string(),
            temperature: 0.3,
            projects_dir: base_dir.to_path_buf(),
            artifact_log: base_dir.join("extracted_data.json"),
            upload_dir: base_dir.join("temp"),
            db_user: "postgres".to_string(),
            db_name: "mydb".to_string(),
            batch_size: 1,
            max_attempts: 2,
        }
    }
}
