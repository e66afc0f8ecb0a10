//! Implementation of the `stencil create` command.
//!
//! Responsibility: translate CLI arguments into a generation request for a
//! new project, run it, and display results.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use stencil_adapters::StaticPluginLoader;
use stencil_adapters::builtin_plugins::BASE_ID;
use stencil_core::{
    application::{GenerationRequest, Plugin, PluginOptions},
    domain::{Manifest, to_short_plugin_id},
};

use crate::{
    cli::{CreateArgs, GlobalArgs, OutputFormat},
    commands::{build_service, parse_options},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `stencil create` command.
///
/// Dispatch sequence:
/// 1. Parse and validate the project name / output path
/// 2. Resolve plugins (base first), prompting when none were given
/// 3. Clear or refuse an existing directory
/// 4. Run the generation with a full tree
/// 5. Print next-steps guidance
#[instrument(skip_all, fields(project = %args.name))]
pub fn execute(
    args: CreateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    // 1. Resolve project path
    let (project_name, project_path) = resolve_project_path(&args.name)?;
    validate_project_name(&project_name)?;

    // 2. Resolve plugins
    let loader = StaticPluginLoader::with_builtins();
    let requested = if args.plugins.is_empty() && prompt_allowed(&global, &output) {
        select_plugins(&loader)?
    } else {
        args.plugins.clone()
    };
    let ids = resolve_plugin_ids(&loader, &requested)?;
    debug!(plugins = ?ids, "plugins resolved");

    let all_options = parse_options(args.options.as_deref())?;
    let mut plugins = Vec::with_capacity(ids.len());
    for id in &ids {
        let generator = loader.get(id).ok_or_else(|| not_found(&loader, id))?;
        let options = options_for(&all_options, id)?;
        plugins.push(Plugin::new(id.clone(), generator).with_options(options));
    }

    // 3. Check for existing directory
    if project_path.exists() && !args.force {
        return Err(CliError::ProjectExists { path: project_path });
    }

    // 4. Generate
    let dev_range = format!("~{}", stencil_core::VERSION);
    let manifest = Manifest::for_new_project(
        &project_name,
        ids.iter().map(|id| (id.as_str(), dev_range.as_str())),
    );
    let service = build_service(&config, output.diagnostics())?;

    output.header(&format!("Creating '{project_name}'..."))?;
    let spinner = output.spinner("Running plugins");
    let request =
        GenerationRequest::new(&project_path, manifest, plugins).replacing(args.force);
    let result = service.generate(request);
    spinner.finish_and_clear();
    let report = result?;

    info!(
        project = %project_name,
        written = report.written.len(),
        "project created"
    );

    // 5. Success + next steps
    if output.format() == OutputFormat::Json {
        let summary = json!({
            "project": project_name,
            "path": project_path.display().to_string(),
            "plugins": ids,
            "written": report.written,
        });
        println!("{summary}");
        return Ok(());
    }

    let changes = report.changes.to_string();
    output.print(changes.trim_end())?;
    output.success(&format!("Project '{project_name}' created!"))?;

    if !global.quiet {
        output.print("")?;
        output.print("Next steps:")?;
        output.print(&format!("  cd {}", project_path.display()))?;
        output.print("  npm install")?;
        output.print("  npm start")?;
    }

    Ok(())
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Split `name` into the project name (last segment) and the project path.
pub fn resolve_project_path(name: &str) -> CliResult<(String, PathBuf)> {
    let path = Path::new(name);

    let project_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidProjectName {
            name: name.into(),
            reason: "cannot extract valid project name".into(),
        })?
        .to_string();

    Ok((project_name, path.to_path_buf()))
}

fn validate_project_name(name: &str) -> CliResult<()> {
    if name.is_empty() {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot be empty".into(),
        });
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot start with '.' or '_'".into(),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot contain path separators".into(),
        });
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: format!("'{c}' is not allowed in a package name"),
        });
    }
    Ok(())
}

// ── Plugin resolution ─────────────────────────────────────────────────────────

/// Full ids to apply: base first, then the requested plugins in order.
fn resolve_plugin_ids(loader: &StaticPluginLoader, requested: &[String]) -> CliResult<Vec<String>> {
    let mut ids = vec![BASE_ID.to_owned()];
    for input in requested {
        let id = loader.find(input).ok_or_else(|| not_found(loader, input))?;
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_owned());
        }
    }
    Ok(ids)
}

/// Options for `id`, keyed by its full or short id.
fn options_for(all: &Map<String, Value>, id: &str) -> CliResult<PluginOptions> {
    let short = to_short_plugin_id(id);
    match all.get(id).or_else(|| all.get(&short)) {
        None => Ok(PluginOptions::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(CliError::invalid_input(format!(
            "options for '{short}' must be a JSON object"
        ))),
    }
}

fn not_found(loader: &StaticPluginLoader, id: &str) -> CliError {
    CliError::PluginNotFound {
        id: id.to_owned(),
        available: loader.ids().map(to_short_plugin_id).collect(),
    }
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn prompt_allowed(global: &GlobalArgs, output: &OutputManager) -> bool {
    cfg!(feature = "interactive")
        && !global.quiet
        && output.format() == OutputFormat::Human
        && std::io::stdin().is_terminal()
}

#[cfg(feature = "interactive")]
fn select_plugins(loader: &StaticPluginLoader) -> CliResult<Vec<String>> {
    use dialoguer::{MultiSelect, theme::ColorfulTheme};

    let choices: Vec<String> = loader
        .ids()
        .filter(|id| *id != BASE_ID)
        .map(to_short_plugin_id)
        .collect();
    let labels: Vec<String> = choices
        .iter()
        .map(|short| {
            let full = loader.find(short).unwrap_or_default();
            format!("{short:<10} {}", stencil_adapters::builtin_plugins::describe(full))
        })
        .collect();

    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select plugins (space to toggle)")
        .items(&labels)
        .interact_opt()
        .map_err(|e| CliError::IoError {
            message: "failed to read plugin selection".into(),
            source: std::io::Error::other(e),
        })?
        .ok_or(CliError::Cancelled)?;

    Ok(picked.into_iter().map(|i| choices[i].clone()).collect())
}

#[cfg(not(feature = "interactive"))]
fn select_plugins(_loader: &StaticPluginLoader) -> CliResult<Vec<String>> {
    Ok(Vec::new())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
