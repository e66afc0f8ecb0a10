//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `stencil-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: persisting the file tree
//!   - `PluginLoader`: resolving plugin generators and installed versions
//!   - `ManifestSource`, `ProjectReader`: reading an existing project
//!   - `DiagnosticsSink`: user-facing messages
//!   - `SyntaxBackend`: parsing source files for mutation
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    DiagnosticsSink, Filesystem, ManifestSource, PluginLoader, ProjectReader, SyntaxBackend,
};

#[cfg(test)]
pub use output::{
    MockDiagnosticsSink, MockFilesystem, MockManifestSource, MockPluginLoader, MockProjectReader,
    MockSyntaxBackend,
};
