// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (carried into reports and diagnostics)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path '{path}' escapes the project directory")]
    PathOutsideProject { path: String },

    #[error("Invalid version range '{range}'")]
    InvalidRange { range: String },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Manifest field '{field}' must be an object")]
    InvalidManifestField { field: String },

    // ========================================================================
    // Compatibility Errors
    // ========================================================================
    #[error("Required stencil version is \"{required}\" but the running version is \"{actual}\"")]
    IncompatibleCliVersion { required: String, actual: String },

    #[error("Version range must be an integer or a string, got {0}")]
    InvalidVersionRequirement(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AbsolutePathNotAllowed { path } | Self::PathOutsideProject { path } => vec![
                format!("Offending path: {}", path),
                "Plugins must write paths relative to the project root".into(),
            ],
            Self::InvalidRange { range } => vec![
                format!("'{}' is not a valid npm version range", range),
                "Examples: ^1.2.0, ~2.0.0, >=1.0.0 <2.0.0, owner/repo, git+https://...".into(),
            ],
            Self::InvalidManifest(_) | Self::InvalidManifestField { .. } => vec![
                "Check that package.json is a JSON object".into(),
                "dependencies, devDependencies and scripts must be objects".into(),
            ],
            Self::IncompatibleCliVersion { required, .. } => vec![
                format!("Upgrade stencil to a version matching {}", required),
            ],
            Self::InvalidVersionRequirement(_) => {
                vec!["Pass a major version number or a range string".into()]
            }
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AbsolutePathNotAllowed { .. }
            | Self::PathOutsideProject { .. }
            | Self::InvalidRange { .. }
            | Self::InvalidVersionRequirement(_) => ErrorCategory::Validation,
            Self::IncompatibleCliVersion { .. } => ErrorCategory::Compatibility,
            Self::InvalidManifest(_) | Self::InvalidManifestField { .. } => {
                ErrorCategory::Validation
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
