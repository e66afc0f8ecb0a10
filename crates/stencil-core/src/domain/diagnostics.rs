//! Diagnostics and exit logs.
//!
//! The core never prints. Everything a user should see (merge conflicts,
//! failed source mutations, plugin exit messages) becomes a [`Diagnostic`]
//! routed to a `DiagnosticsSink` port.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic, mirroring the log kinds a plugin may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Log,
    Info,
    Done,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Log => "log",
            Self::Info => "info",
            Self::Done => "done",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single message for the user, optionally attributed to a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub plugin_id: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            plugin_id: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn attributed_to(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin_id {
            Some(id) => write!(f, "[{}] {}", id, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A message queued by a plugin through `exit_log`, flushed after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitLogEntry {
    pub plugin_id: String,
    pub message: String,
    pub severity: Severity,
}
