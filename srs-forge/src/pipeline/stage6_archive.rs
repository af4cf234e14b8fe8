//! Stage 6: archive
//!
//! Zips the generated project directory (paths relative to the project root)
//! into `<project_name>.zip` next to it and records the archive path in
//! state for the caller.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use srs_forge_sdk::log_state_file;

use crate::archive::zip_project;
use crate::pipeline::types::{keys, PipelineState, Stage, StageContext, StageUpdate};

pub struct ArchiveStage;

const STAGE: usize = 6;

#[async_trait]
impl Stage for ArchiveStage {
    fn name(&self) -> &'static str {
        "archive"
    }

    async fn run(&self, state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate> {
        let handle = ctx.project_handle(state)?;
        let zip_path = zip_project(&handle, &ctx.config.projects_dir)?;
        println!("✅ Project zip file created: {}", zip_path.display());
        log_state_file!(STAGE, zip_path.display(), "Project archive");

        Ok(StageUpdate::new().with(keys::ZIP_FILE, json!(zip_path.display().to_string())))
    }
}
