//! Infrastructure adapters for Stencil.
//!
//! This crate implements the ports defined in `stencil-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod builtin_plugins;
pub mod diagnostics;
pub mod filesystem;
pub mod manifest_source;
pub mod plugin_loader;
pub mod project_reader;
pub mod syntax;

// Re-export commonly used adapters
pub use diagnostics::{MemoryDiagnostics, TracingDiagnostics};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use manifest_source::JsonManifestSource;
pub use plugin_loader::StaticPluginLoader;
pub use project_reader::WalkdirProjectReader;
pub use syntax::{BackendError, TreeSitterBackend};
