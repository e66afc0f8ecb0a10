//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stencil",
    bin_name = "stencil",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Plugin-driven project scaffolding",
    long_about = "Stencil creates JavaScript projects from plugins and lets \
                  you invoke further plugins inside an existing project.",
    after_help = "EXAMPLES:\n\
        \x20 stencil create my-api --plugin eslint --plugin logger\n\
        \x20 stencil invoke logger --dir my-api\n\
        \x20 stencil list --format json\n\
        \x20 stencil completions bash > /usr/share/bash-completion/completions/stencil",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project.
    #[command(
        visible_alias = "c",
        about = "Create a new project",
        after_help = "EXAMPLES:\n\
            \x20 stencil create my-api\n\
            \x20 stencil create my-api --plugin eslint --plugin logger\n\
            \x20 stencil create my-api --plugin logger --options '{\"logger\": {\"prefix\": \"[api]\"}}'"
    )]
    Create(CreateArgs),

    /// Run one plugin inside an existing project.
    #[command(
        visible_alias = "i",
        about = "Invoke a plugin in an existing project",
        after_help = "EXAMPLES:\n\
            \x20 stencil invoke eslint\n\
            \x20 stencil invoke logger --dir ./my-api --options '{\"prefix\": \"[api]\"}'"
    )]
    Invoke(InvokeArgs),

    /// List available plugins.
    #[command(
        visible_alias = "ls",
        about = "List available plugins",
        after_help = "EXAMPLES:\n\
            \x20 stencil list\n\
            \x20 stencil list --format json"
    )]
    List(ListArgs),

    /// Initialise a Stencil configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 stencil init           # default location\n\
            \x20 stencil init --force   # overwrite an existing file"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stencil completions bash > ~/.local/share/bash-completion/completions/stencil\n\
            \x20 stencil completions zsh  > ~/.zfunc/_stencil\n\
            \x20 stencil completions fish > ~/.config/fish/completions/stencil.fish"
    )]
    Completions(CompletionsArgs),
}

// ── create ────────────────────────────────────────────────────────────────────

/// Arguments for `stencil create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Project name or path.  A plain name creates `./name`; a path like
    /// `../foo` places the project one level up.
    #[arg(value_name = "NAME", help = "Project name or path")]
    pub name: String,

    /// Plugins to apply after the base plugin, in order.
    #[arg(
        short = 'p',
        long = "plugin",
        value_name = "ID",
        help = "Plugin to apply (repeatable)"
    )]
    pub plugins: Vec<String>,

    /// Overwrite an existing directory (destructive).
    #[arg(long = "force", help = "Overwrite existing directory")]
    pub force: bool,

    /// Plugin options as a JSON object keyed by plugin id.
    #[arg(
        long = "options",
        value_name = "JSON",
        help = "Plugin options, e.g. '{\"logger\": {\"prefix\": \"[api]\"}}'"
    )]
    pub options: Option<String>,
}

// ── invoke ────────────────────────────────────────────────────────────────────

/// Arguments for `stencil invoke`.
#[derive(Debug, Args)]
pub struct InvokeArgs {
    /// Plugin id, full or short.
    #[arg(value_name = "PLUGIN", help = "Plugin to invoke")]
    pub plugin: String,

    /// Project directory.
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        help = "Project directory (default: current directory)"
    )]
    pub dir: Option<PathBuf>,

    /// Options for the plugin as a JSON object.
    #[arg(long = "options", value_name = "JSON", help = "Plugin options as JSON")]
    pub options: Option<String>,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `stencil list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One id per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `stencil init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stencil completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_create_with_plugins() {
        let cli = Cli::parse_from([
            "stencil", "create", "my-api", "-p", "eslint", "--plugin", "logger",
        ]);
        let Commands::Create(args) = cli.command else {
            panic!("expected Create command");
        };
        assert_eq!(args.name, "my-api");
        assert_eq!(args.plugins, ["eslint", "logger"]);
        assert!(!args.force);
    }

    #[test]
    fn parse_invoke_with_dir() {
        let cli = Cli::parse_from(["stencil", "invoke", "logger", "--dir", "app"]);
        let Commands::Invoke(args) = cli.command else {
            panic!("expected Invoke command");
        };
        assert_eq!(args.plugin, "logger");
        assert_eq!(args.dir, Some(PathBuf::from("app")));
    }

    #[test]
    fn list_defaults_to_table() {
        let cli = Cli::parse_from(["stencil", "ls"]);
        assert!(matches!(
            cli.command,
            Commands::List(ListArgs {
                format: ListFormat::Table
            })
        ));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        // clap should reject --quiet --verbose together
        let result = Cli::try_parse_from(["stencil", "--quiet", "--verbose", "list"]);
        assert!(result.is_err());
    }
}
