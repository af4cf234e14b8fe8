//! Stage 3: source generation
//!
//! Per endpoint: a route file and a service file. Per table: a SQLAlchemy
//! model file. One auth handler when the spec declares authentication. Same
//! fan-out discipline as test generation.

use anyhow::Result;
use async_trait::async_trait;

use crate::pipeline::generate::{run_generation_tasks, GenerationTask};
use crate::pipeline::types::{
    sanitize_filename, PipelineState, Stage, StageContext, StageUpdate, StructuredRequirements,
};
use crate::workspace::ProjectHandle;

pub struct CodeGenStage;

const STAGE: usize = 3;

#[async_trait]
impl Stage for CodeGenStage {
    fn name(&self) -> &'static str {
        "codegen"
    }

    async fn run(&self, state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate> {
        let handle = ctx.project_handle(state)?;
        let spec = state.parsed_spec().unwrap_or_default();

        let tasks = plan_tasks(&spec, &handle);
        println!("⚙️  Generating {} source files...", tasks.len());
        run_generation_tasks(
            ctx.generator.as_ref(),
            STAGE,
            &tasks,
            ctx.config.batch_size,
        )
        .await?;

        Ok(StageUpdate::new())
    }
}

fn plan_tasks(spec: &StructuredRequirements, handle: &ProjectHandle) -> Vec<GenerationTask> {
    let mut tasks = Vec::new();

    for endpoint in &spec.api_endpoints {
        let stem = sanitize_filename(&endpoint.path);
        let method = endpoint.method.to_uppercase();
        let parameters = serde_json::to_string(&endpoint.parameters).unwrap_or_default();

        tasks.push(GenerationTask {
            task_id: format!("codegen_route_{}", stem),
            description: format!("Route for {} {}", method, endpoint.path),
            prompt: route_prompt(&method, &endpoint.path, &parameters),
            dest: handle.join(&format!("app/api/routes/{}.py", stem)),
        });
        tasks.push(GenerationTask {
            task_id: format!("codegen_service_{}", stem),
            description: format!("Service layer for {} {}", method, endpoint.path),
            prompt: service_prompt(&method, &endpoint.path, &parameters),
            dest: handle.join(&format!("app/services/{}_service.py", stem)),
        });
    }

    for (table_name, table) in &spec.database_schema.tables {
        let stem = sanitize_filename(table_name);
        tasks.push(GenerationTask {
            task_id: format!("codegen_model_{}", stem),
            description: format!("Model for table {}", table_name),
            prompt: model_prompt(
                table_name,
                &serde_json::to_string(&table.columns).unwrap_or_default(),
                &table.primary_key,
                &serde_json::to_string(&table.foreign_keys).unwrap_or_default(),
            ),
            dest: handle.join(&format!("app/models/{}.py", stem)),
        });
    }

    if !spec.authentication.auth_type.is_empty() {
        tasks.push(GenerationTask {
            task_id: "codegen_auth".to_string(),
            description: format!("{} authentication handler", spec.authentication.auth_type),
            prompt: auth_prompt(
                &spec.authentication.auth_type,
                &serde_json::to_string(&spec.authentication.roles).unwrap_or_default(),
                &serde_json::to_string(&spec.authentication.rules).unwrap_or_default(),
            ),
            dest: handle.join("app/auth.py"),
        });
    }

    tasks
}

fn route_prompt(method: &str, path: &str, parameters: &str) -> String {
    format!(
        r#"Write strict FastAPI code for a {method} API endpoint:
- Path: {path}
- Method: {method}
- Parameters: {parameters}
"#
    )
}

fn service_prompt(method: &str, path: &str, parameters: &str) -> String {
    format!(
        r#"Write a service layer for the {method} API endpoint:
- Path: {path}
- Method: {method}
- Parameters: {parameters}
- Include necessary CRUD logic based on the json file provided and test cases.
"#
    )
}

fn model_prompt(table: &str, columns: &str, primary_key: &str, foreign_keys: &str) -> String {
    format!(
        r#"Write strict FastAPI SQLAlchemy model code:
- Table: {table}
- Columns: {columns}
- Primary Key: {primary_key}
- Foreign Keys: {foreign_keys}
"#
    )
}

fn auth_prompt(auth_type: &str, roles: &str, rules: &str) -> String {
    format!(
        r#"Write strict FastAPI code for {auth_type} authentication handler:
- Authentication Type: {auth_type}
- Roles: {roles}
- Rules: {rules}
"#
    )
}
