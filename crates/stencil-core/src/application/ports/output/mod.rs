//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stencil-adapters` crate provides implementations.

use std::path::Path;
use std::sync::Arc;

use semver::Version;

use crate::application::plugin::PluginGenerator;
use crate::domain::{Diagnostic, FileTree, Manifest, MutationFailure, SyntaxTree};
use crate::error::StencilResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `stencil_adapters::filesystem::LocalFilesystem` (production)
/// - `stencil_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Write bytes to a file, creating parent directories as needed.
    fn write_file(&self, path: &Path, content: &[u8]) -> StencilResult<()>;

    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> StencilResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> StencilResult<()>;
}

/// Port for locating plugin generators.
///
/// Implemented by:
/// - `stencil_adapters::plugin_loader::StaticPluginLoader` (built-in plugins)
#[cfg_attr(test, mockall::automock)]
pub trait PluginLoader: Send + Sync {
    /// Generator for `id`, or `None` if the plugin cannot be loaded.
    fn load_generator(&self, id: &str, context: &Path) -> Option<Arc<dyn PluginGenerator>>;

    /// Version of `id` installed in the project at `context`.
    fn installed_version(&self, id: &str, context: &Path) -> Option<Version>;
}

/// Port for reading the project manifest.
#[cfg_attr(test, mockall::automock)]
pub trait ManifestSource: Send + Sync {
    /// Load `package.json` for the project at `context`.
    ///
    /// A missing or malformed manifest is a configuration error.
    fn load(&self, context: &Path) -> StencilResult<Manifest>;
}

/// Port for reading an existing project into a change-tracked tree.
#[cfg_attr(test, mockall::automock)]
pub trait ProjectReader: Send + Sync {
    fn read_project(&self, context: &Path) -> StencilResult<FileTree>;
}

/// Port receiving user-facing diagnostics.
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Port for parsing source files into an editable outline.
///
/// Implemented by:
/// - `stencil_adapters::syntax::TreeSitterBackend` (TypeScript grammar)
#[cfg_attr(test, mockall::automock)]
pub trait SyntaxBackend: Send + Sync {
    /// Parse `source`. Text with syntax errors is rejected.
    fn parse(&self, source: &str) -> Result<SyntaxTree, MutationFailure>;
}
