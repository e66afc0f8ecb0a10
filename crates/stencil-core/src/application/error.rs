//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during a generation run.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// A plugin's `apply` or `hooks` returned an error.
    #[error("Plugin '{plugin_id}' failed: {reason}")]
    PluginInvocation { plugin_id: String, reason: String },

    /// A post-process callback failed while resolving files.
    #[error("Post-processing registered by '{plugin_id}' failed: {reason}")]
    PostProcessFailed { plugin_id: String, reason: String },

    /// A deferred hook failed after the tree was written.
    #[error("Hook registered by '{plugin_id}' failed: {reason}")]
    HookFailed { plugin_id: String, reason: String },

    /// Plugin id is not installed or not known to the loader.
    #[error("Plugin '{plugin_id}' could not be found")]
    PluginNotFound { plugin_id: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Project already exists at target location.
    #[error("Project already exists at {path}")]
    ProjectExists { path: PathBuf },
}

impl ApplicationError {
    pub fn filesystem(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::FilesystemError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::PluginInvocation { plugin_id, .. }
            | Self::PostProcessFailed { plugin_id, .. }
            | Self::HookFailed { plugin_id, .. } => vec![
                format!("The error was raised by {}", plugin_id),
                "Nothing was written for a failure before the write phase".into(),
            ],
            Self::PluginNotFound { plugin_id } => vec![
                format!("Add {} to devDependencies and install it", plugin_id),
                "Try: stencil list to see built-in plugins".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::ProjectExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Use --force to overwrite (destructive)".into(),
                "Choose a different project name".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PluginInvocation { .. }
            | Self::PostProcessFailed { .. }
            | Self::HookFailed { .. } => ErrorCategory::Plugin,
            Self::PluginNotFound { .. } => ErrorCategory::NotFound,
            Self::FilesystemError { .. } => ErrorCategory::Internal,
            Self::ProjectExists { .. } => ErrorCategory::Validation,
        }
    }

    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            Self::PluginInvocation { plugin_id, .. }
            | Self::PostProcessFailed { plugin_id, .. }
            | Self::HookFailed { plugin_id, .. }
            | Self::PluginNotFound { plugin_id } => Some(plugin_id),
            _ => None,
        }
    }
}
