//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use stencil_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{StencilError, StencilResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn write_file(&self, path: &Path, content: &[u8]) -> StencilResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| map_io_error(parent, e, "create directory"))?;
        }
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn remove_file(&self, path: &Path) -> StencilResult<()> {
        std::fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> StencilResult<()> {
        std::fs::remove_dir_all(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> StencilError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_file_creates_missing_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("src/middleware/logger.js");

        LocalFilesystem::new()
            .write_file(&path, b"module.exports = {};\n")
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "module.exports = {};\n"
        );
    }

    #[test]
    fn remove_file_deletes_and_reports_missing_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("drop.js");
        std::fs::write(&path, "x").unwrap();
        let fs = LocalFilesystem::new();

        fs.remove_file(&path).unwrap();
        assert!(!fs.exists(&path));

        let err = fs.remove_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to remove file"));
    }

    #[test]
    fn remove_dir_all_clears_the_whole_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("demo");
        let fs = LocalFilesystem::new();
        fs.write_file(&root.join("src/index.js"), b"run();").unwrap();

        fs.remove_dir_all(&root).unwrap();

        assert!(!fs.exists(&root));
        assert!(fs.remove_dir_all(&root).is_err());
    }

    #[test]
    fn binary_content_is_written_verbatim() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logo.bin");
        let bytes = [0u8, 159, 146, 150];

        LocalFilesystem::new().write_file(&path, &bytes).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
