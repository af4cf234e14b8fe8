//! Project zip archival
//!
//! Thin wrapper over the zip crate: every file under the project directory,
//! deflated, with paths relative to the project root. The archive lands next
//! to the project directory and is named after it.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;

use crate::workspace::ProjectHandle;

/// Zip a generated project, returning the archive path
pub fn zip_project(project: &ProjectHandle, dest_dir: &Path) -> Result<PathBuf> {
    let zip_path = dest_dir.join(format!("{}.zip", project.name));
    let file = File::create(&zip_path)
        .with_context(|| format!("Failed to create archive {}", zip_path.display()))?;
    let mut writer = zip::ZipWriter::new(file);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(&project.root).sort_by_file_name() {
        let entry = entry.context("Failed to walk project directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&project.root)
            .context("walked path outside project root")?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer
            .start_file(&name, options)
            .with_context(|| format!("Failed to add {} to archive", name))?;
        let mut source = File::open(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        io::copy(&mut source, &mut writer)
            .with_context(|| format!("Failed to copy {} into archive", name))?;
    }

    writer.finish().context("Failed to finalize archive")?;
    Ok(zip_path)
}
