//! SDK for srs-forge pipeline stages
//!
//! Provides the structured log events a pipeline run emits on stderr (one
//! JSON line per event, prefixed with a sentinel so supervising processes
//! can pick them out of mixed output) and the helper macros stages use to
//! emit them.

use serde::{Deserialize, Serialize};

// Re-export async trait for convenience
pub use async_trait::async_trait;

/// Structured logging events emitted by pipeline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineLog {
    /// Stage started
    StageStarted {
        stage: usize,
        name: String,
        total_stages: usize,
    },
    /// Stage completed
    StageCompleted { stage: usize, name: String },
    /// Stage failed
    StageFailed {
        stage: usize,
        name: String,
        error: String,
    },
    /// A new attempt over the whole stage sequence started
    AttemptStarted { attempt: usize, max_attempts: usize },
    /// Generation task started (one endpoint, table, or auth unit)
    TaskStarted {
        stage: usize,
        task_id: String,
        description: String,
        total_tasks: Option<usize>,
    },
    /// Generation task completed
    TaskCompleted {
        task_id: String,
        result: Option<String>,
    },
    /// Generation task failed (degraded, not fatal)
    TaskFailed { task_id: String, error: String },
    /// Artifact or state file written (intermediate outputs)
    StateFileCreated {
        stage: usize,
        file_path: String,
        description: String,
    },
}

impl PipelineLog {
    /// Emit this log event to stderr for supervisor parsing
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("__SRS_EVENT__:{}", json);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }
}

/// Helper macros for pipeline logging
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $name:expr, $total:expr) => {
        $crate::PipelineLog::StageStarted {
            stage: $stage,
            name: $name.to_string(),
            total_stages: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $name:expr) => {
        $crate::PipelineLog::StageCompleted {
            stage: $stage,
            name: $name.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_failed {
    ($stage:expr, $name:expr, $error:expr) => {
        $crate::PipelineLog::StageFailed {
            stage: $stage,
            name: $name.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_attempt_start {
    ($attempt:expr, $max:expr) => {
        $crate::PipelineLog::AttemptStarted {
            attempt: $attempt,
            max_attempts: $max,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_start {
    ($stage:expr, $task_id:expr, $desc:expr) => {
        $crate::PipelineLog::TaskStarted {
            stage: $stage,
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
            total_tasks: None,
        }
        .emit();
    };
    ($stage:expr, $task_id:expr, $desc:expr, $total:expr) => {
        $crate::PipelineLog::TaskStarted {
            stage: $stage,
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
            total_tasks: Some($total),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_complete {
    ($task_id:expr) => {
        $crate::PipelineLog::TaskCompleted {
            task_id: $task_id.to_string(),
            result: None,
        }
        .emit();
    };
    ($task_id:expr, $result:expr) => {
        $crate::PipelineLog::TaskCompleted {
            task_id: $task_id.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_failed {
    ($task_id:expr, $error:expr) => {
        $crate::PipelineLog::TaskFailed {
            task_id: $task_id.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_state_file {
    ($stage:expr, $path:expr, $desc:expr) => {
        $crate::PipelineLog::StateFileCreated {
            stage: $stage,
            file_path: $path.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}
