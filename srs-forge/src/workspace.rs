//! Generated project directory management
//!
//! The scaffold stage creates one `fastapi_project_<timestamp>` directory per
//! run and the handle is threaded through pipeline state to every consumer.
//! Latest-timestamp discovery exists only as a fallback for state that lost
//! the handle; it is not the primary contract.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix shared by all generated project directories
pub const PROJECT_PREFIX: &str = "fastapi_project_";

/// Fixed subtree created inside every project
pub const PROJECT_SUBTREE: [&str; 4] = ["app/api/routes", "app/models", "app/services", "tests"];

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no {PROJECT_PREFIX}* directory found under {0}")]
    NotFound(PathBuf),
    #[error("workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Location of one generated project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectHandle {
    pub name: String,
    pub root: PathBuf,
}

impl ProjectHandle {
    pub fn join(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Owner of the directory family that holds generated projects
#[derive(Debug, Clone)]
pub struct ProjectWorkspace {
    base: PathBuf,
}

impl ProjectWorkspace {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Allocate a fresh timestamped project directory with the fixed subtree
    ///
    /// Two runs starting within the same second get distinct directories (a
    /// numeric suffix disambiguates), so the handle stays unambiguous.
    pub fn create(&self) -> Result<ProjectHandle, WorkspaceError> {
        std::fs::create_dir_all(&self.base)?;
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let mut name = format!("{}{}", PROJECT_PREFIX, stamp);
        let mut attempt = 0;
        loop {
            let root = self.base.join(&name);
            match std::fs::create_dir(&root) {
                Ok(()) => {
                    for sub in PROJECT_SUBTREE {
                        std::fs::create_dir_all(root.join(sub))?;
                    }
                    return Ok(ProjectHandle { name, root });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    name = format!("{}{}_{}", PROJECT_PREFIX, stamp, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Discover the most recently named project directory
    ///
    /// "Latest" means lexicographically greatest name with the fixed prefix,
    /// which matches timestamp order for the naming scheme above.
    pub fn latest(&self) -> Result<ProjectHandle, WorkspaceError> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.base) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.starts_with(PROJECT_PREFIX))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        names.sort();
        let name = names
            .pop()
            .ok_or_else(|| WorkspaceError::NotFound(self.base.clone()))?;
        let root = self.base.join(&name);
        Ok(ProjectHandle { name, root })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}
