//! Stage 4: README generation
//!
//! Walks the generated tree, assembles a markdown skeleton (structure,
//! backend logic, endpoints, schema, setup instructions) and asks the model
//! to turn it into the final README. When the call fails the skeleton itself
//! is written, so the project always ships with a usable README.

use anyhow::Result;
use async_trait::async_trait;
use srs_forge_sdk::{log_task_complete, log_task_failed, log_task_start};
use walkdir::WalkDir;

use crate::pipeline::generate::{clean_generated_code, write_file};
use crate::pipeline::types::{
    PipelineState, Stage, StageContext, StageUpdate, StructuredRequirements,
};
use crate::workspace::ProjectHandle;

pub struct ReadmeStage;

const STAGE: usize = 4;

#[async_trait]
impl Stage for ReadmeStage {
    fn name(&self) -> &'static str {
        "readme"
    }

    async fn run(&self, state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate> {
        let handle = ctx.project_handle(state)?;
        let spec = state.parsed_spec().unwrap_or_default();
        let skeleton = readme_skeleton(&spec, &handle);

        log_task_start!(STAGE, "readme", "Generating project README");
        let content = match ctx.generator.complete(&readme_prompt(&skeleton)).await {
            Ok(text) => {
                log_task_complete!("readme");
                clean_generated_code(&text)
            }
            Err(e) => {
                log_task_failed!("readme", e);
                eprintln!("⚠️  README generation failed, keeping assembled skeleton: {}", e);
                skeleton
            }
        };

        write_file(&handle.join("README.md"), &format!("{}\n", content.trim_end()))?;
        println!("📄 README written for {}", handle.name);
        Ok(StageUpdate::new())
    }
}

fn readme_prompt(skeleton: &str) -> String {
    format!(
        r#"Rewrite the following project notes into a polished README.md for a generated FastAPI project.
Keep every section, keep the endpoint and schema details accurate, and add concise setup and run instructions.
ONLY return the markdown document.

{skeleton}
"#
    )
}

/// Assemble the markdown skeleton the model polishes
fn readme_skeleton(spec: &StructuredRequirements, handle: &ProjectHandle) -> String {
    let mut doc = String::from("# Project Setup and Structure\n\n");
    doc.push_str(
        "This README outlines the project setup, structure, and relevant details to get started with the FastAPI project.\n\n",
    );

    doc.push_str("## Project Folder Structure\n");
    for entry in WalkDir::new(&handle.root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        let relative = entry
            .path()
            .strip_prefix(&handle.root)
            .unwrap_or(entry.path())
            .display();
        if entry.file_type().is_dir() {
            doc.push_str(&format!("- **{}**: Folder\n", relative));
        } else if entry.path().extension().is_some_and(|ext| ext == "py") {
            doc.push_str(&format!("- **{}**: Python source code file\n", relative));
        }
    }
    doc.push('\n');

    doc.push_str("## Backend Logic\n");
    if spec.backend_logic.is_empty() {
        doc.push_str("- No backend logic rules were extracted.\n");
    }
    for rule in &spec.backend_logic {
        doc.push_str(&format!("- {}\n", rule));
    }
    doc.push('\n');

    doc.push_str("## API Endpoints\n");
    for endpoint in &spec.api_endpoints {
        doc.push_str(&format!(
            "- `{} {}`: {}\n",
            endpoint.method, endpoint.path, endpoint.description
        ));
    }
    doc.push('\n');

    doc.push_str("## Database Schema\n");
    for (table, schema) in &spec.database_schema.tables {
        let columns: Vec<String> = schema
            .columns
            .iter()
            .map(|(name, kind)| format!("{} ({})", name, kind))
            .collect();
        doc.push_str(&format!("- **{}**: {}\n", table, columns.join(", ")));
    }
    doc.push('\n');

    doc.push_str("## Setup\n");
    doc.push_str("1. `pip install -r requirements.txt`\n");
    doc.push_str("2. Configure `DATABASE_URL` in `.env`\n");
    doc.push_str("3. `uvicorn app.main:app --reload`\n");
    doc
}
