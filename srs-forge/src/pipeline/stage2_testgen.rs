//! Stage 2: pytest generation
//!
//! One model call per endpoint, table, and auth block, each producing a
//! pytest file under the project's `tests/` directory. Calls run with
//! bounded concurrency; a failed call degrades that one test file to a stub.

use anyhow::Result;
use async_trait::async_trait;

use crate::pipeline::generate::{run_generation_tasks, GenerationTask};
use crate::pipeline::types::{
    sanitize_filename, PipelineState, Stage, StageContext, StageUpdate, StructuredRequirements,
};
use crate::workspace::ProjectHandle;

pub struct TestGenStage;

const STAGE: usize = 2;

#[async_trait]
impl Stage for TestGenStage {
    fn name(&self) -> &'static str {
        "testgen"
    }

    async fn run(&self, state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate> {
        let handle = ctx.project_handle(state)?;
        let spec = state.parsed_spec().unwrap_or_default();

        let tasks = plan_tasks(&spec, &handle);
        println!("🧪 Generating {} test files...", tasks.len());
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
        tasks.push(GenerationTask {
            task_id: format!("testgen_{}", stem),
            description: format!("Tests for {} {}", endpoint.method, endpoint.path),
            prompt: endpoint_test_prompt(
                &endpoint.method,
                &endpoint.path,
                &endpoint.description,
                &serde_json::to_string(&endpoint.parameters).unwrap_or_default(),
            ),
            dest: handle.join(&format!("tests/test_{}.py", stem)),
        });
    }

    for (table_name, table) in &spec.database_schema.tables {
        let stem = sanitize_filename(table_name);
        tasks.push(GenerationTask {
            task_id: format!("testgen_db_{}", stem),
            description: format!("Tests for table {}", table_name),
            prompt: table_test_prompt(
                table_name,
                &serde_json::to_string(&table.columns).unwrap_or_default(),
                &table.primary_key,
                &serde_json::to_string(&table.foreign_keys).unwrap_or_default(),
            ),
            dest: handle.join(&format!("tests/test_db_{}.py", stem)),
        });
    }

    if !spec.authentication.auth_type.is_empty() {
        tasks.push(GenerationTask {
            task_id: "testgen_auth".to_string(),
            description: format!("Tests for {} authentication", spec.authentication.auth_type),
            prompt: auth_test_prompt(
                &spec.authentication.auth_type,
                &serde_json::to_string(&spec.authentication.roles).unwrap_or_default(),
                &serde_json::to_string(&spec.authentication.rules).unwrap_or_default(),
            ),
            dest: handle.join("tests/test_auth.py"),
        });
    }

    tasks
}

fn endpoint_test_prompt(method: &str, path: &str, description: &str, parameters: &str) -> String {
    format!(
        r#"Given this FastAPI endpoint:

Path: {path}
Method: {method}
Description: {description}
Parameters: {parameters}

Write complete pytest unit tests to validate this endpoint.
- Include tests for both success and failure cases.
- Handle path and query parameters if provided.
- If authentication is needed, handle token and authentication scenarios.

ONLY return valid Python test code, no explanations or comments.
"#
    )
}

fn table_test_prompt(table: &str, columns: &str, primary_key: &str, foreign_keys: &str) -> String {
    format!(
        r#"Given this database table schema:

Table: {table}
Columns: {columns}
Primary Key: {primary_key}
Foreign Keys: {foreign_keys}

Write complete pytest unit tests to validate CRUD operations and validations for this table schema.
Include edge cases, exception handling, and boundary conditions.

ONLY return valid Python test code, no explanations or comments.
"#
    )
}

fn auth_test_prompt(auth_type: &str, roles: &str, rules: &str) -> String {
    format!(
        r#"Given this authentication schema:

Authentication Type: {auth_type}
Roles: {roles}
Rules: {rules}

Write complete pytest unit tests to validate authentication.
Include tests for each role's access to the corresponding APIs and their restrictions.

ONLY return valid Python test code, no explanations or comments.
"#
    )
}
