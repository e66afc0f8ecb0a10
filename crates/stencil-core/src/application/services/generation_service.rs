//! Generation Service - main application orchestrator.
//!
//! A run goes through a fixed sequence of phases:
//!
//! 1. collect `after_any_invoke` hooks from every installed plugin
//! 2. apply the active plugins in order
//! 3. restore the hooks collected in phase 1
//! 4. normalize paths and run post-process callbacks
//! 5. finalize `package.json`
//! 6. write the tree
//! 7. run `after_invoke` then `after_any_invoke` hooks
//!
//! A failure before phase 6 leaves the disk untouched. A replacing request
//! clears the project directory at the start of phase 6.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::application::plugin::{BoxError, Plugin, PluginOptions};
use crate::application::ports::{DiagnosticsSink, Filesystem, PluginLoader, SyntaxBackend};
use crate::application::services::generator_api::{
    GenerationSettings, GeneratorApi, RunEnv, RunState,
};
use crate::application::services::hooks::{HookQueue, PostProcessQueue};
use crate::application::ApplicationError;
use crate::domain::{
    ChangedFiles, DepSources, Diagnostic, ExitLogEntry, FileContent, FileTree, Manifest,
    to_short_plugin_id,
};
use crate::error::StencilResult;

const MANIFEST_FILE: &str = "package.json";

/// Input of a single generation run.
pub struct GenerationRequest {
    /// Project root.
    pub context: PathBuf,
    pub manifest: Manifest,
    /// Active plugins, applied in this order.
    pub plugins: Vec<Plugin>,
    /// Full tree for new projects, tracked tree for existing ones.
    pub files: FileTree,
    /// Hooks seeded by the caller.
    pub after_invoke: HookQueue,
    pub invoking: bool,
    /// Remove whatever is at `context` before writing.
    pub replace_existing: bool,
}

impl GenerationRequest {
    pub fn new(context: impl Into<PathBuf>, manifest: Manifest, plugins: Vec<Plugin>) -> Self {
        Self {
            context: context.into(),
            manifest,
            plugins,
            files: FileTree::new(),
            after_invoke: HookQueue::new(),
            invoking: false,
            replace_existing: false,
        }
    }

    pub fn with_files(mut self, files: FileTree) -> Self {
        self.files = files;
        self
    }

    pub fn invoking(mut self, invoking: bool) -> Self {
        self.invoking = invoking;
        self
    }

    pub fn replacing(mut self, replace_existing: bool) -> Self {
        self.replace_existing = replace_existing;
        self
    }

    pub fn with_after_invoke(mut self, hooks: HookQueue) -> Self {
        self.after_invoke = hooks;
        self
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Tree keys written to disk.
    pub written: Vec<String>,
    /// Tree keys removed from disk.
    pub removed: Vec<String>,
    pub changes: ChangedFiles,
    /// Whether `dependencies`/`devDependencies` differ from the input manifest.
    pub dependencies_changed: bool,
    pub manifest: Manifest,
    pub dep_sources: DepSources,
    pub diagnostics: Vec<Diagnostic>,
    pub exit_logs: Vec<ExitLogEntry>,
    pub hooks_run: usize,
}

/// Main generation service.
pub struct GenerationService {
    loader: Box<dyn PluginLoader>,
    filesystem: Box<dyn Filesystem>,
    parser: Box<dyn SyntaxBackend>,
    diagnostics: Box<dyn DiagnosticsSink>,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(
        loader: Box<dyn PluginLoader>,
        filesystem: Box<dyn Filesystem>,
        parser: Box<dyn SyntaxBackend>,
        diagnostics: Box<dyn DiagnosticsSink>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            loader,
            filesystem,
            parser,
            diagnostics,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn loader(&self) -> &dyn PluginLoader {
        self.loader.as_ref()
    }

    /// Run every phase against `request`.
    #[instrument(
        skip_all,
        fields(
            context = %request.context.display(),
            plugins = request.plugins.len(),
            invoking = request.invoking
        )
    )]
    pub fn generate(&self, request: GenerationRequest) -> StencilResult<GenerationReport> {
        let GenerationRequest {
            context,
            manifest,
            plugins,
            files,
            after_invoke,
            invoking,
            replace_existing,
        } = request;

        let original_manifest = manifest.clone();
        let all_plugin_ids = manifest.plugin_ids();
        let active_ids: Vec<String> = plugins.iter().map(|p| p.id.clone()).collect();
        let before = files.snapshot();

        let mut state = RunState {
            context,
            manifest,
            dep_sources: DepSources::new(),
            files,
            after_invoke,
            after_any_invoke: HookQueue::new(),
            post_process: PostProcessQueue::default(),
            exit_logs: Vec::new(),
            diagnostics: Vec::new(),
            active_ids,
            all_plugin_ids,
            invoking,
        };

        let any_hooks = self.collect_any_hooks(&mut state)?;
        self.apply_active(&mut state, &plugins)?;
        // Registrations made while applying are not authoritative.
        let discarded = std::mem::replace(&mut state.after_any_invoke, any_hooks);
        if !discarded.is_empty() {
            debug!(count = discarded.len(), "dropping after_any_invoke hooks from active pass");
        }

        self.resolve_files(&mut state)?;
        self.finalize_manifest(&mut state);
        if replace_existing {
            self.clear_target(&state.context)?;
        }
        let (written, removed) = self.write_tree(&state.context, &state.files, &before)?;

        let changes = state.files.diff(&before);
        let dependencies_changed = state.manifest.dependencies_differ(&original_manifest);

        let after_invoke = std::mem::take(&mut state.after_invoke);
        let after_any = std::mem::take(&mut state.after_any_invoke);
        info!(
            after_invoke = after_invoke.len(),
            after_any_invoke = after_any.len(),
            "running hooks"
        );
        let hooks_run = after_invoke.run_all()? + after_any.run_all()?;

        self.flush_exit_logs(&state.exit_logs);
        info!(written = written.len(), removed = removed.len(), "generation complete");

        Ok(GenerationReport {
            written,
            removed,
            changes,
            dependencies_changed,
            manifest: state.manifest,
            dep_sources: state.dep_sources,
            diagnostics: state.diagnostics,
            exit_logs: state.exit_logs,
            hooks_run,
        })
    }

    // -------------------------------------------------------------------------
    // Phases
    // -------------------------------------------------------------------------

    /// Phase 1. Returns the `after_any_invoke` hooks; `after_invoke` and
    /// post-process registrations from this pass are dropped.
    fn collect_any_hooks(&self, state: &mut RunState) -> StencilResult<HookQueue> {
        let passed_after_invoke = std::mem::take(&mut state.after_invoke);
        let no_options = PluginOptions::new();
        let ids = state.all_plugin_ids.clone();
        let active = state.active_ids.clone();

        for id in &ids {
            let Some(generator) = self.loader.load_generator(id, &state.context) else {
                debug!(plugin = %id, "installed plugin has no loadable generator");
                continue;
            };
            let Some(hooks) = generator.hooks() else {
                continue;
            };
            let mut api = GeneratorApi::new(id, &no_options, state, self.env());
            hooks
                .register(&mut api, &no_options, &active)
                .map_err(|e| invocation_error(id, e))?;
        }

        let any_hooks = std::mem::take(&mut state.after_any_invoke);
        let leaked = std::mem::replace(&mut state.after_invoke, passed_after_invoke);
        if !leaked.is_empty() {
            debug!(count = leaked.len(), "dropping after_invoke hooks from collection pass");
        }
        state.post_process = PostProcessQueue::default();
        info!(count = any_hooks.len(), "collected after_any_invoke hooks");
        Ok(any_hooks)
    }

    /// Phase 2.
    fn apply_active(&self, state: &mut RunState, plugins: &[Plugin]) -> StencilResult<()> {
        let active = state.active_ids.clone();
        let invoking = state.invoking;

        for plugin in plugins {
            info!(plugin = %plugin.id, "applying plugin");
            let mut api = GeneratorApi::new(&plugin.id, &plugin.options, state, self.env());
            plugin
                .generator
                .apply(&mut api, &plugin.options, invoking)
                .map_err(|e| invocation_error(&plugin.id, e))?;

            if let Some(hooks) = plugin.generator.hooks() {
                hooks
                    .register(&mut api, &plugin.options, &active)
                    .map_err(|e| invocation_error(&plugin.id, e))?;
            }
        }
        Ok(())
    }

    /// Phase 4.
    fn resolve_files(&self, state: &mut RunState) -> StencilResult<()> {
        state.files.normalize_all();
        let queue = std::mem::take(&mut state.post_process);
        debug!(callbacks = queue.len(), "post-processing files");
        queue.run_all(&mut state.files)?;
        Ok(())
    }

    /// Phase 5.
    fn finalize_manifest(&self, state: &mut RunState) {
        state.manifest.finalize();
        let text = state.manifest.to_json_string();
        debug!(manifest = %text, "finalized manifest");
        state.files.set(MANIFEST_FILE, text);
    }

    /// Phase 6, for replacing requests.
    fn clear_target(&self, context: &Path) -> StencilResult<()> {
        if self.filesystem.exists(context) {
            info!(path = %context.display(), "removing existing directory");
            self.filesystem.remove_dir_all(context)?;
        }
        Ok(())
    }

    /// Phase 6.
    fn write_tree(
        &self,
        context: &Path,
        files: &FileTree,
        before: &BTreeMap<String, FileContent>,
    ) -> StencilResult<(Vec<String>, Vec<String>)> {
        let set = files.write_set(before);
        info!(
            writes = set.writes.len(),
            removes = set.removes.len(),
            tracked = files.is_tracked(),
            "writing file tree"
        );

        for key in &set.removes {
            let path = context.join(key);
            if self.filesystem.exists(&path) {
                self.filesystem.remove_file(&path)?;
            } else {
                warn!(path = %path.display(), "file scheduled for removal is already gone");
            }
        }
        for key in &set.writes {
            if let Some(content) = files.get(key) {
                self.filesystem
                    .write_file(&context.join(key), content.as_bytes())?;
            }
        }
        Ok((set.writes, set.removes))
    }

    fn flush_exit_logs(&self, logs: &[ExitLogEntry]) {
        for entry in logs {
            let diagnostic = Diagnostic::new(entry.severity, entry.message.clone())
                .attributed_to(to_short_plugin_id(&entry.plugin_id));
            self.diagnostics.emit(&diagnostic);
        }
    }

    fn env(&self) -> RunEnv<'_> {
        RunEnv {
            loader: self.loader.as_ref(),
            parser: self.parser.as_ref(),
            diagnostics: self.diagnostics.as_ref(),
            settings: &self.settings,
        }
    }
}

fn invocation_error(plugin_id: &str, error: BoxError) -> ApplicationError {
    ApplicationError::PluginInvocation {
        plugin_id: plugin_id.to_owned(),
        reason: error.to_string(),
    }
}
