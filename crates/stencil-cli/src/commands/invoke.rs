//! Implementation of the `stencil invoke` command.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info, instrument};

use stencil_adapters::{JsonManifestSource, StaticPluginLoader, WalkdirProjectReader};
use stencil_core::{
    application::{GenerationRequest, ManifestSource, Plugin, ProjectReader},
    domain::{Manifest, is_plugin, resolve_plugin_id, to_short_plugin_id},
};

use crate::{
    cli::{GlobalArgs, InvokeArgs, OutputFormat},
    commands::{build_service, parse_options},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

const OFFICIAL_PREFIX: &str = "@stencil/cli-plugin-";

/// Execute the `stencil invoke` command.
///
/// The plugin must already be a dependency of the project. Existing files are
/// read into a change-tracked tree, so only what the plugin touches is
/// written back.
#[instrument(skip_all, fields(plugin = %args.plugin))]
pub fn execute(
    args: InvokeArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let dir = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));

    let manifest = JsonManifestSource::new().load(&dir)?;
    let id = find_installed(&manifest, &args.plugin).ok_or_else(|| {
        CliError::PluginNotInstalled {
            id: args.plugin.clone(),
            dir: dir.clone(),
        }
    })?;
    debug!(plugin = %id, "plugin located in manifest");

    let loader = StaticPluginLoader::with_builtins();
    let generator = loader.get(&id).ok_or_else(|| CliError::PluginNotFound {
        id: id.clone(),
        available: loader.ids().map(to_short_plugin_id).collect(),
    })?;
    let options = parse_options(args.options.as_deref())?;

    let files = WalkdirProjectReader::new().read_project(&dir)?;
    debug!(files = files.len(), "existing project read");

    let service = build_service(&config, output.diagnostics())?;
    let short = to_short_plugin_id(&id);
    output.header(&format!("Invoking '{short}'..."))?;

    let spinner = output.spinner("Running plugin");
    let plugin = Plugin::new(id.clone(), generator).with_options(options);
    let request = GenerationRequest::new(&dir, manifest, vec![plugin])
        .with_files(files)
        .invoking(true);
    let result = service.generate(request);
    spinner.finish_and_clear();
    let report = result?;

    info!(
        plugin = %id,
        changed = report.changes.len(),
        dependencies_changed = report.dependencies_changed,
        "plugin invoked"
    );

    if output.format() == OutputFormat::Json {
        let summary = json!({
            "plugin": id,
            "created": report.changes.created,
            "modified": report.changes.modified,
            "removed": report.changes.removed,
            "dependenciesChanged": report.dependencies_changed,
        });
        println!("{summary}");
        return Ok(());
    }

    if report.changes.is_empty() {
        output.info("No files changed")?;
    } else {
        output.print("Changed files:")?;
        let changes = report.changes.to_string();
        output.print(changes.trim_end())?;
    }
    output.success(&format!("Invoked '{short}'"))?;

    if report.dependencies_changed && !global.quiet {
        output.warning(&format!(
            "Dependencies changed; run `npm install` in {}",
            display_dir(&dir)
        ))?;
    }

    Ok(())
}

/// Full id of the installed plugin `input` refers to.
///
/// `devDependencies` are searched before `dependencies`; within each, the
/// official `@stencil/cli-plugin-<name>` wins over the community id.
fn find_installed(manifest: &Manifest, input: &str) -> Option<String> {
    let candidates = if is_plugin(input) {
        vec![input.to_owned()]
    } else {
        let mut c = Vec::with_capacity(2);
        if !input.starts_with('@') {
            c.push(format!("{OFFICIAL_PREFIX}{input}"));
        }
        c.push(resolve_plugin_id(input));
        c
    };

    ["devDependencies", "dependencies"]
        .into_iter()
        .filter_map(|field| manifest.field_map(field))
        .find_map(|deps| candidates.iter().find(|id| deps.contains_key(id.as_str())).cloned())
}

fn display_dir(dir: &Path) -> String {
    if dir == Path::new(".") {
        "the current directory".into()
    } else {
        dir.display().to_string()
    }
}
