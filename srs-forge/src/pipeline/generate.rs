//! Shared generation task helpers
//!
//! Both the test and code generation stages fan one model call out per unit
//! (endpoint, table, auth block). A failed call degrades that one unit to a
//! stub file and a task-failed event instead of aborting the stage.

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use srs_forge_sdk::{log_task_complete, log_task_failed, log_task_start};
use std::path::{Path, PathBuf};
use tokio::sync::Semaphore;

use crate::generator::ExternalGenerator;

/// One fan-out unit: a prompt and the file it generates
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub task_id: String,
    pub description: String,
    pub prompt: String,
    pub dest: PathBuf,
}

/// Run generation tasks with bounded concurrency
///
/// `batch_size` of 1 reproduces the original serial loop; larger values let
/// independent model calls overlap.
pub async fn run_generation_tasks(
    generator: &dyn ExternalGenerator,
    stage: usize,
    tasks: &[GenerationTask],
    batch_size: usize,
) -> Result<()> {
    let semaphore = Semaphore::new(batch_size.max(1));
    let mut in_flight = FuturesUnordered::new();

    for task in tasks {
        let semaphore = &semaphore;
        in_flight.push(async move {
            let _permit = semaphore
                .acquire()
                .await
                .context("generation semaphore closed")?;
            generate_source_file(
                generator,
                stage,
                &task.task_id,
                &task.description,
                &task.prompt,
                &task.dest,
            )
            .await
        });
    }

    while let Some(result) = in_flight.next().await {
        result?;
    }
    Ok(())
}

/// Write a file, creating parent directories as needed
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Strip markdown code fences from generated source, keeping the inner body
pub fn clean_generated_code(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(fence_start) = trimmed.find("```") {
        let after_fence = &trimmed[fence_start + 3..];
        // Skip the language tag on the opening fence line
        let body_start = after_fence.find('\n').map(|pos| pos + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        let body_end = body.rfind("```").unwrap_or(body.len());
        return body[..body_end].trim().to_string();
    }
    trimmed.to_string()
}

/// Generate one source file from a prompt, degrading to a stub on failure
pub async fn generate_source_file(
    generator: &dyn ExternalGenerator,
    stage: usize,
    task_id: &str,
    description: &str,
    prompt: &str,
    dest: &Path,
) -> Result<()> {
    log_task_start!(stage, task_id, description);

    let content = match generator.complete(prompt).await {
        Ok(text) => {
            let code = clean_generated_code(&text);
            log_task_complete!(task_id, dest.display());
            code
        }
        Err(e) => {
            log_task_failed!(task_id, e);
            eprintln!("⚠️  {} degraded to a stub: {}", task_id, e);
            format!("# TODO: regenerate, model call failed: {}\n", e)
        }
    };

    write_file(dest, &format!("{}\n", content.trim_end()))?;
    Ok(())
}
