//! Diagnostics sinks.

use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use stencil_core::application::ports::DiagnosticsSink;
use stencil_core::domain::{Diagnostic, Severity};

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic) {
        let plugin = diagnostic.plugin_id.as_deref().unwrap_or("-");
        let message = diagnostic.message.as_str();
        match diagnostic.severity {
            Severity::Log | Severity::Info | Severity::Done => info!(plugin, "{message}"),
            Severity::Warn => warn!(plugin, "{message}"),
            Severity::Error => error!(plugin, "{message}"),
        }
    }
}

/// Collects diagnostics in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryDiagnostics {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|d| d.message).collect()
    }
}

impl DiagnosticsSink for MemoryDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_shares_entries_between_clones() {
        let sink = MemoryDiagnostics::new();
        let handle = sink.clone();
        sink.emit(&Diagnostic::warn("careful").attributed_to("eslint"));

        let entries = handle.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Warn);
        assert_eq!(entries[0].plugin_id.as_deref(), Some("eslint"));
        assert_eq!(handle.messages(), ["careful"]);
    }
}
