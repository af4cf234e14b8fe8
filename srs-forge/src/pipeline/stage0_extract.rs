//! Stage 0: requirements extraction
//!
//! Reads the SRS document text, asks the model for the structured
//! requirements record in STRICT JSON, and appends the result to the
//! extraction log. When the text yields no database schema and the document
//! embeds images, a vision call over the first image is tried as a fallback.
//! Parse and model failures degrade to an empty record; the run continues
//! with whatever was recovered.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use srs_forge_sdk::{log_state_file, log_task_complete, log_task_failed, log_task_start};
use std::path::Path;

use crate::docx;
use crate::extract::parse_json_lenient;
use crate::pipeline::types::{
    keys, DatabaseSchema, PipelineState, Stage, StageContext, StageUpdate, StructuredRequirements,
};

pub struct ExtractStage;

const STAGE: usize = 0;

#[async_trait]
impl Stage for ExtractStage {
    fn name(&self) -> &'static str {
        "extract"
    }

    async fn run(&self, state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate> {
        let Some(srs_file) = state.get_str(keys::SRS_FILE) else {
            bail!("srs_file missing from initial state");
        };
        let srs_path = Path::new(srs_file);
        if !srs_path.exists() {
            bail!("File not found: {}", srs_file);
        }

        let srs_text = docx::extract_text(srs_path)?;

        log_task_start!(STAGE, "analyze", "Extracting structured requirements from SRS text");
        let mut spec = match ctx.generator.complete(&extraction_prompt(&srs_text)).await {
            Ok(raw) => parse_requirements(&raw),
            Err(e) => {
                log_task_failed!("analyze", e);
                eprintln!("⚠️  extraction call failed, continuing with empty requirements: {}", e);
                StructuredRequirements::default()
            }
        };
        log_task_complete!(
            "analyze",
            format!(
                "{} endpoints, {} tables",
                spec.api_endpoints.len(),
                spec.database_schema.tables.len()
            )
        );

        // Schema diagrams sometimes live only in an embedded image
        if spec.database_schema.tables.is_empty() {
            if let Some(schema) = self.schema_from_images(srs_path, ctx).await? {
                println!("✅ Extracted DB schema from embedded image.");
                spec.database_schema = schema;
            }
        }

        ctx.store.append(&spec)?;
        log_state_file!(
            STAGE,
            ctx.store.path().display(),
            "Extraction record appended"
        );

        Ok(StageUpdate::new()
            .with(keys::PARSED_SPEC, serde_json::to_value(&spec)?)
            .with(keys::SRS_TEXT, json!(srs_text)))
    }
}

impl ExtractStage {
    async fn schema_from_images(
        &self,
        srs_path: &Path,
        ctx: &StageContext,
    ) -> Result<Option<DatabaseSchema>> {
        let images = docx::extract_images(srs_path)?;
        let Some(image) = images.first() else {
            return Ok(None);
        };

        println!("🔍 No DB schema found in text. Trying to extract from image...");
        log_task_start!(STAGE, "vision", "Extracting database schema from diagram");
        let raw = match ctx.generator.complete_vision(VISION_PROMPT, image).await {
            Ok(raw) => raw,
            Err(e) => {
                log_task_failed!("vision", e);
                return Ok(None);
            }
        };

        let parsed: Option<Value> = parse_json_lenient(&raw).unwrap_or_else(|e| {
            eprintln!("❌ Failed to parse JSON from vision response: {}", e);
            None
        });
        let schema = parsed
            .and_then(|value| value.get("database_schema").cloned())
            .and_then(|value| serde_json::from_value::<DatabaseSchema>(value).ok())
            .filter(|schema| !schema.tables.is_empty());

        if schema.is_some() {
            log_task_complete!("vision");
        }
        Ok(schema)
    }
}

/// Parse the extraction reply, degrading to an empty record on failure
fn parse_requirements(raw: &str) -> StructuredRequirements {
    match parse_json_lenient::<StructuredRequirements>(raw) {
        Ok(Some(spec)) => spec,
        Ok(None) => {
            eprintln!("⚠️  extraction reply contained no JSON object, continuing with empty requirements");
            StructuredRequirements::default()
        }
        Err(e) => {
            eprintln!("⚠️  extraction reply was not valid JSON ({}), continuing with empty requirements", e);
            StructuredRequirements::default()
        }
    }
}

fn extraction_prompt(srs_text: &str) -> String {
    format!(
        r#"You are a senior backend architect. Analyze the given Software Requirements Specification (SRS) and extract the following technical elements in STRICT JSON format:

Return JSON like:
{{
  "api_endpoints": [
    {{
      "method": "GET",
      "path": "/users",
      "description": "Retrieve all users",
      "parameters": [{{ "name": "page", "type": "int", "required": false }}]
    }}
  ],
  "backend_logic": [
    "Users must be filtered by active status.",
    "If user role is admin, show all data."
  ],
  "database_schema": {{
    "tables": {{
      "users": {{
        "columns": {{
          "id": "integer",
          "name": "string",
          "email": "string",
          "created_at": "datetime"
        }},
        "primary_key": "id",
        "foreign_keys": []
      }}
    }}
  }},
  "authentication": {{
    "type": "JWT",
    "roles": ["admin", "user"],
    "rules": ["Admins can access all routes", "Users limited to /profile"]
  }}
}}

Be concise, structured, and correct. Avoid explanations. Only return the JSON.
----
SRS TEXT:
{srs_text}
"#
    )
}

const VISION_PROMPT: &str = r#"You are a backend engineer. Analyze this diagram and extract the database schema in JSON like:

{
  "database_schema": {
    "tables": {
      "table_name": {
        "columns": {
          "column_name": "data_type"
        },
        "primary_key": "column_name",
        "foreign_keys": [
          {"column": "name", "references": "other_table(column)"}
        ]
      }
    }
  }
}

Only respond with JSON. No markdown or extra text.
"#;
