//! Reads an existing project into a change-tracked tree.

use std::fs;
use std::path::Path;

use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use stencil_core::application::{ApplicationError, ports::ProjectReader};
use stencil_core::domain::{FileContent, FileTree, normalize_path};
use stencil_core::error::StencilResult;

/// Directories never read into the tree.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirProjectReader;

impl WalkdirProjectReader {
    pub fn new() -> Self {
        Self
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

impl ProjectReader for WalkdirProjectReader {
    #[instrument(skip_all, fields(context = %context.display()))]
    fn read_project(&self, context: &Path) -> StencilResult<FileTree> {
        if !context.is_dir() {
            return Err(
                ApplicationError::filesystem(context, "project directory does not exist").into(),
            );
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(context)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped(e));

        for entry in walker {
            let entry = entry.map_err(|e| {
                ApplicationError::filesystem(context, format!("directory walk error: {e}"))
            })?;
            if !entry.file_type().is_file() {
                continue; // Skip directories, symlinks and other special types.
            }
            let abs_path = entry.path();
            let rel = abs_path.strip_prefix(context).map_err(|_| {
                ApplicationError::filesystem(abs_path, "file is outside the project")
            })?;
            let bytes = fs::read(abs_path).map_err(|e| ApplicationError::filesystem(abs_path, e))?;
            files.push((
                normalize_path(&rel.to_string_lossy()),
                FileContent::from_bytes(bytes),
            ));
        }

        debug!(files = files.len(), "read existing project");
        Ok(FileTree::tracked(files))
    }
}
