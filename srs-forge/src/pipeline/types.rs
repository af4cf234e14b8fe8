//! Data structures for the generation pipeline
//!
//! Pipeline state is a string-keyed mapping accumulated across stages; the
//! structured requirements record is the JSON shape the extraction stage
//! produces and every later stage consumes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::artifact::ArtifactStore;
use crate::config::PipelineConfig;
use crate::generator::ExternalGenerator;
use crate::workspace::{ProjectHandle, ProjectWorkspace};

/// Well-known pipeline state keys
pub mod keys {
    pub const SRS_FILE: &str = "srs_file";
    pub const SRS_TEXT: &str = "srs_text";
    pub const PARSED_SPEC: &str = "parsed_spec";
    pub const PROJECT_NAME: &str = "project_name";
    pub const PROJECT_DIR: &str = "project_dir";
    pub const DB_USER: &str = "db_user";
    pub const DB_PASSWORD: &str = "db_password";
    pub const DB_NAME: &str = "db_name";
    pub const TESTS_PASSED: &str = "tests_passed";
    pub const ZIP_FILE: &str = "zip_file";
    pub const ERROR: &str = "error";
}

/// Accumulated state threaded through the stage sequence
///
/// Merging is per-key last-write-wins and can never delete a key: once a
/// stage has written something, every later stage can still read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineState {
    values: BTreeMap<String, Value>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state for a run over one SRS document
    pub fn for_srs_file(path: impl Into<PathBuf>) -> Self {
        let mut state = Self::new();
        state.set(keys::SRS_FILE, Value::String(path.into().display().to_string()));
        state
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge a partial update, last write wins per key
    pub fn merge(&mut self, update: StageUpdate) {
        for (key, value) in update.entries {
            self.values.insert(key, value);
        }
    }

    /// The extracted requirements, when the extract stage has run
    pub fn parsed_spec(&self) -> Option<StructuredRequirements> {
        self.values
            .get(keys::PARSED_SPEC)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// The project handle threaded through state by the scaffold stage
    pub fn project_handle(&self) -> Option<ProjectHandle> {
        let name = self.get_str(keys::PROJECT_NAME)?.to_string();
        let root = PathBuf::from(self.get_str(keys::PROJECT_DIR)?);
        Some(ProjectHandle { name, root })
    }
}

/// Partial state update returned by one stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageUpdate {
    entries: BTreeMap<String, Value>,
}

impl StageUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared resources every stage runs against
pub struct StageContext {
    pub config: PipelineConfig,
    pub generator: Arc<dyn ExternalGenerator>,
    pub store: ArtifactStore,
    pub workspace: ProjectWorkspace,
}

impl StageContext {
    pub fn new(config: PipelineConfig, generator: Arc<dyn ExternalGenerator>) -> Self {
        let store = ArtifactStore::new(&config.artifact_log);
        let workspace = ProjectWorkspace::new(&config.projects_dir);
        Self {
            config,
            generator,
            store,
            workspace,
        }
    }

    /// Resolve the project handle for a generation stage
    ///
    /// The handle threaded through state is the contract; latest-directory
    /// discovery is only the fallback for state that lost it.
    pub fn project_handle(&self, state: &PipelineState) -> Result<ProjectHandle> {
        if let Some(handle) = state.project_handle() {
            return Ok(handle);
        }
        eprintln!("⚠️  project handle missing from state, falling back to latest-directory discovery");
        Ok(self.workspace.latest()?)
    }
}

/// One pipeline step
///
/// A stage receives the accumulated state and returns a partial update to
/// merge into it. Stages are safe to invoke at most once per attempt and do
/// not roll back partial file output on error.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate>;
}

fn default_method() -> String {
    "GET".to_string()
}

/// Requirements record extracted from one SRS document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredRequirements {
    pub api_endpoints: Vec<ApiEndpoint>,
    pub backend_logic: Vec<String>,
    pub database_schema: DatabaseSchema,
    pub authentication: AuthSpec,
}

impl StructuredRequirements {
    /// True when extraction produced no usable content at all
    pub fn is_empty(&self) -> bool {
        self.api_endpoints.is_empty()
            && self.backend_logic.is_empty()
            && self.database_schema.tables.is_empty()
            && self.authentication.auth_type.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpoint {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    pub description: String,
    pub parameters: Vec<EndpointParameter>,
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        Self {
            method: default_method(),
            path: "/".to_string(),
            description: String::new(),
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSchema {
    pub tables: BTreeMap<String, TableSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub columns: BTreeMap<String, String>,
    pub primary_key: String,
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSpec {
    #[serde(rename = "type")]
    pub auth_type: String,
    pub roles: Vec<String>,
    pub rules: Vec<String>,
}

/// Turn an endpoint path or table name into a safe file stem
///
/// `/users/{id}` becomes `users_id`; an empty result falls back to `root`.
pub fn sanitize_filename(path: &str) -> String {
    let cleaned = path
        .trim_matches('/')
        .replace('/', "_")
        .replace(['{', '}'], "");
    if cleaned.is_empty() {
        "root".to_string()
    } else {
        cleaned
    }
}
