// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Stencil.
//!
//! Pure logic only: no filesystem, no terminal, no plugin loading. Parsing
//! of source files is reached through the `SyntaxBackend` port; the domain
//! only sees the resulting outline.
//!
//! - **file_tree**: staged files and the write set
//! - **range / deps**: npm ranges and the dependency merge resolver
//! - **manifest**: `package.json` extension and finalization
//! - **plugin_id**: plugin naming conventions
//! - **syntax**: outlines, buffered insertions, mutation failures
//! - **js_config**: `module.exports = ...` generation
pub mod deps;
pub mod diagnostics;
pub mod error;
pub mod file_tree;
pub mod js_config;
pub mod manifest;
pub mod plugin_id;
pub mod range;
pub mod syntax;

// Re-exports for convenience
pub use deps::{
    DepSources, MergeOptions, MergeOutcome, extract_semver, inject_semver, is_valid_range,
    merge_deps, try_get_newer_range,
};
pub use diagnostics::{Diagnostic, ExitLogEntry, Severity};
pub use error::{DomainError, ErrorCategory};
pub use file_tree::{ChangedFiles, FileContent, FileTree, WriteSet, normalize_path};
pub use js_config::{JsValue, gen_js_config, stringify_js};
pub use manifest::{CANONICAL_KEY_ORDER, ExtendOptions, Manifest};
pub use plugin_id::{is_plugin, matches_plugin_id, resolve_plugin_id, to_short_plugin_id};
pub use range::NodeRange;
pub use syntax::{
    CallBinding, ListElement, ListLiteral, MemberCall, MutationFailure, SourceOutline, Span,
    SyntaxTree,
};
