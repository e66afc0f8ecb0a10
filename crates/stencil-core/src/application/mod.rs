//! Application layer for Stencil.
//!
//! This layer contains:
//! - **Services**: the generation run and the API plugins call into
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Plugin**: the capability a plugin implements
//! - **Errors**: Application-specific error types
//!
//! Merge, ordering and mutation rules live in `crate::domain`; this layer
//! sequences them.

pub mod error;
pub mod plugin;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    CliVersionRequirement, GenerationReport, GenerationRequest, GenerationService,
    GenerationSettings, GeneratorApi, HookQueue, ListEntry, SourceMutator,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    DiagnosticsSink, Filesystem, ManifestSource, PluginLoader, ProjectReader, SyntaxBackend,
};

pub use plugin::{
    BoxError, FnPlugin, Plugin, PluginGenerator, PluginHooks, PluginOptions, PluginResult,
};

pub use error::ApplicationError;
