//! Extraction record append log
//!
//! Every successful (or degraded) extraction is appended to one JSON file
//! holding the ordered list of all past records. The file is rewritten whole
//! on each append; concurrent runs are not coordinated (single-writer
//! convention, documented at the HTTP boundary).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::pipeline::types::StructuredRequirements;

/// JSON-backed append log of extraction records
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, preserving everything already logged
    pub fn append(&self, record: &StructuredRequirements) -> Result<()> {
        let mut records = self.load_all();
        records.push(record.clone());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&records)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write artifact log {}", self.path.display()))?;
        Ok(())
    }

    /// All past records in append order (empty when the log does not exist)
    pub fn load_all(&self) -> Vec<StructuredRequirements> {
        if let Ok(content) = std::fs::read_to_string(&self.path) {
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            Vec::new()
        }
    }
}
