//! Implementation of the `stencil list` command.

use serde::Serialize;

use stencil_adapters::StaticPluginLoader;
use stencil_adapters::builtin_plugins::describe;
use stencil_core::domain::to_short_plugin_id;

use crate::{
    cli::{ListArgs, ListFormat},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// One row of `stencil list`.
#[derive(Debug, Serialize)]
struct PluginRow {
    id: String,
    name: String,
    description: &'static str,
}

pub fn execute(args: ListArgs, output: OutputManager) -> CliResult<()> {
    let rows = plugin_rows(&StaticPluginLoader::with_builtins());

    match args.format {
        ListFormat::Table => {
            output.header("Available Plugins:")?;
            for row in &rows {
                output.print(&format!("  {:<8} {:<28} {}", row.name, row.id, row.description))?;
            }
        }
        ListFormat::Json => {
            // Bypasses OutputManager: JSON must stay parseable even in quiet mode.
            let json = serde_json::to_string_pretty(&rows).map_err(|e| CliError::Internal {
                message: format!("failed to serialise plugin list: {e}"),
            })?;
            println!("{json}");
        }
        ListFormat::List => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }

    Ok(())
}

fn plugin_rows(loader: &StaticPluginLoader) -> Vec<PluginRow> {
    loader
        .ids()
        .map(|id| PluginRow {
            id: id.to_owned(),
            name: to_short_plugin_id(id),
            description: describe(id),
        })
        .collect()
}
