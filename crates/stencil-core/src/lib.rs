//! Stencil Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Stencil
//! plugin-driven scaffolding tool, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           stencil-cli (CLI)             │
//! │     (create / invoke commands)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (GenerationService, GeneratorApi)     │
//! │     Runs plugins in a fixed protocol    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Filesystem, PluginLoader, Syntax, ...) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    stencil-adapters (Infrastructure)    │
//! │ (LocalFilesystem, TreeSitterBackend ..) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (FileTree, merge_deps, Manifest, ...)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use stencil_core::prelude::*;
//!
//! # fn run(service: GenerationService) -> StencilResult<()> {
//! let plugin = FnPlugin::new(|api, _options, _invoking| {
//!     api.write_file("README.md", "# demo\n")?;
//!     api.extend_package(json!({ "scripts": { "start": "node src/index.js" } }))?;
//!     Ok(())
//! });
//!
//! let manifest = Manifest::new();
//! let request = GenerationRequest::new(
//!     "./demo",
//!     manifest,
//!     vec![Plugin::new("stencil-cli-plugin-demo", Arc::new(plugin))],
//! );
//! let report = service.generate(request)?;
//! println!("{}", report.changes);
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        FnPlugin, GenerationReport, GenerationRequest, GenerationService, GenerationSettings,
        GeneratorApi, HookQueue, ListEntry, Plugin, PluginGenerator, PluginHooks, PluginOptions,
        PluginResult,
        ports::{
            DiagnosticsSink, Filesystem, ManifestSource, PluginLoader, ProjectReader, SyntaxBackend,
        },
    };
    pub use crate::domain::{
        Diagnostic, ExtendOptions, FileContent, FileTree, JsValue, Manifest, MutationFailure,
        Severity,
    };
    pub use crate::error::{StencilError, StencilResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
