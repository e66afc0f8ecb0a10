//! Output management and formatting.
//!
//! Command results go to stdout through [`OutputManager`]. Plugin
//! diagnostics go to stderr through [`TerminalDiagnostics`] so that
//! `--format json` output stays parseable.

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::debug;

use stencil_core::application::ports::DiagnosticsSink;
use stencil_core::domain::{Diagnostic, Severity};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        // The flag wins over the config file; Auto resolves to Human (TTY)
        // or Plain (piped/redirected).
        let requested = match (args.output_format, config.output.format.as_str()) {
            (OutputFormat::Auto, "plain") => OutputFormat::Plain,
            (OutputFormat::Auto, "json") => OutputFormat::Json,
            (format, _) => format,
        };
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color || config.output.no_color,
            term: Term::stdout(),
        }
    }
    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Error indicator: `✗ <msg>`. Not suppressed in quiet mode.
    pub fn error(&self, msg: &str) -> io::Result<()> {
        let line = if self.no_color {
            format!("\u{2717} {msg}") // ✗
        } else {
            format!("{} {}", "\u{2717}".red().bold(), msg.red())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// `true` if quiet mode suppresses most output.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }

    /// Sink printing plugin diagnostics with the same colour and quiet
    /// settings as this manager.
    pub fn diagnostics(&self) -> TerminalDiagnostics {
        TerminalDiagnostics {
            no_color: self.no_color,
            quiet: self.quiet,
        }
    }

    /// Spinner shown while a long step runs. Hidden unless the output is
    /// human-facing.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.quiet || self.resolved_format != OutputFormat::Human {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner().with_style(style);
        bar.set_message(message.to_owned());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

/// Writes diagnostics to stderr, one line each.
///
/// Quiet mode keeps warnings and errors only.
#[derive(Debug, Clone, Copy)]
pub struct TerminalDiagnostics {
    no_color: bool,
    quiet: bool,
}

impl TerminalDiagnostics {
    /// Render one diagnostic without writing it.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let icon = match diagnostic.severity {
            Severity::Log => " ",
            Severity::Info => "\u{2139}", // ℹ
            Severity::Done => "\u{2713}", // ✓
            Severity::Warn => "\u{26a0}", // ⚠
            Severity::Error => "\u{2717}", // ✗
        };
        let prefix = diagnostic
            .plugin_id
            .as_deref()
            .map(|id| format!("[{id}] "))
            .unwrap_or_default();

        if self.no_color {
            return format!("{icon} {prefix}{}", diagnostic.message);
        }
        let icon = match diagnostic.severity {
            Severity::Log => icon.to_string(),
            Severity::Info => icon.blue().bold().to_string(),
            Severity::Done => icon.green().bold().to_string(),
            Severity::Warn => icon.yellow().bold().to_string(),
            Severity::Error => icon.red().bold().to_string(),
        };
        format!("{icon} {}{}", prefix.dimmed(), diagnostic.message)
    }

    fn is_shown(&self, severity: Severity) -> bool {
        !self.quiet || matches!(severity, Severity::Warn | Severity::Error)
    }
}

impl DiagnosticsSink for TerminalDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic) {
        debug!(
            severity = %diagnostic.severity,
            plugin = diagnostic.plugin_id.as_deref().unwrap_or("-"),
            message = %diagnostic.message,
            "diagnostic"
        );
        if !self.is_shown(diagnostic.severity) {
            return;
        }
        // A closed stderr is not worth failing the run over.
        let _ = Term::stderr().write_line(&self.render(diagnostic));
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
