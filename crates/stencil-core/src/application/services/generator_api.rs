//! The API object a plugin sees.
//!
//! One `GeneratorApi` is built per plugin call. It is bound to the plugin's
//! id and options and borrows the run state, so every file write, manifest
//! edit and hook registration lands in the current generation run.

use std::path::{Component, Path, PathBuf};

use semver::Version;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::plugin::{BoxError, PluginOptions};
use crate::application::ports::{DiagnosticsSink, PluginLoader, SyntaxBackend};
use crate::application::services::hooks::{HookQueue, PostProcessQueue};
use crate::application::services::source_mutator::{ListEntry, SourceMutator};
use crate::domain::{
    DepSources, Diagnostic, DomainError, ExitLogEntry, ExtendOptions, FileContent, FileTree,
    JsValue, Manifest, MutationFailure, NodeRange, Severity, gen_js_config, matches_plugin_id,
    normalize_path,
};

/// Knobs for a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Function whose call results form the ordered binding block.
    pub loader_function: String,
    /// Default for [`ExtendOptions::warn_incompatible_versions`].
    pub warn_incompatible_versions: bool,
    /// Version reported to [`GeneratorApi::assert_cli_version`].
    pub cli_version: Version,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            loader_function: "require".into(),
            warn_incompatible_versions: true,
            cli_version: Version::parse(crate::VERSION).unwrap_or_else(|_| Version::new(0, 1, 0)),
        }
    }
}

/// Range accepted by [`GeneratorApi::assert_cli_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliVersionRequirement {
    /// A major version `n`, meaning `^n.0.0-0`.
    Major(u64),
    Range(String),
}

impl From<u64> for CliVersionRequirement {
    fn from(major: u64) -> Self {
        Self::Major(major)
    }
}

impl From<&str> for CliVersionRequirement {
    fn from(range: &str) -> Self {
        Self::Range(range.to_owned())
    }
}

/// Ports the API needs while a run is in progress.
#[derive(Clone, Copy)]
pub(crate) struct RunEnv<'a> {
    pub loader: &'a dyn PluginLoader,
    pub parser: &'a dyn SyntaxBackend,
    pub diagnostics: &'a dyn DiagnosticsSink,
    pub settings: &'a GenerationSettings,
}

/// Everything a run mutates. Created fresh per generation.
pub(crate) struct RunState {
    pub context: PathBuf,
    pub manifest: Manifest,
    pub dep_sources: DepSources,
    pub files: FileTree,
    pub after_invoke: HookQueue,
    pub after_any_invoke: HookQueue,
    pub post_process: PostProcessQueue,
    pub exit_logs: Vec<ExitLogEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub active_ids: Vec<String>,
    pub all_plugin_ids: Vec<String>,
    pub invoking: bool,
}

pub struct GeneratorApi<'run> {
    id: &'run str,
    options: &'run PluginOptions,
    state: &'run mut RunState,
    env: RunEnv<'run>,
}

impl<'run> GeneratorApi<'run> {
    pub(crate) fn new(
        id: &'run str,
        options: &'run PluginOptions,
        state: &'run mut RunState,
        env: RunEnv<'run>,
    ) -> Self {
        Self {
            id,
            options,
            state,
            env,
        }
    }

    // ── identity ──────────────────────────────────────────────────────────

    /// Id of the plugin this API is bound to.
    pub fn id(&self) -> &str {
        self.id
    }

    pub fn options(&self) -> &PluginOptions {
        self.options
    }

    /// `true` when the plugin runs inside an existing project.
    pub fn invoking(&self) -> bool {
        self.state.invoking
    }

    /// Project root.
    pub fn context(&self) -> &Path {
        &self.state.context
    }

    pub fn cli_version(&self) -> &Version {
        &self.env.settings.cli_version
    }

    /// Absolute path of `segments` under the project root.
    pub fn resolve<I, S>(&self, segments: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.state.context.clone();
        for s in segments {
            path.push(s);
        }
        path
    }

    /// Turn any plugin-supplied path into a tree key.
    ///
    /// Absolute paths must lie inside the project root.
    pub fn normalize_path(&self, path: &str) -> Result<String, DomainError> {
        let candidate = Path::new(path);
        let relative = if candidate.is_absolute() {
            candidate
                .strip_prefix(&self.state.context)
                .map_err(|_| DomainError::PathOutsideProject { path: path.into() })?
                .to_string_lossy()
                .into_owned()
        } else {
            path.to_owned()
        };

        if Path::new(&relative.replace('\\', "/"))
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(DomainError::PathOutsideProject { path: path.into() });
        }
        Ok(normalize_path(&relative))
    }

    // ── files ─────────────────────────────────────────────────────────────

    pub fn write_file(
        &mut self,
        path: &str,
        content: impl Into<FileContent>,
    ) -> Result<(), DomainError> {
        let key = self.normalize_path(path)?;
        debug!(plugin = %self.id, path = %key, "write");
        self.state.files.set(key, content);
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> Option<&FileContent> {
        let key = self.normalize_path(path).ok()?;
        self.state.files.get(key)
    }

    pub fn read_text(&self, path: &str) -> Option<&str> {
        self.read_file(path).and_then(FileContent::as_text)
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.read_file(path).is_some()
    }

    pub fn delete_file(&mut self, path: &str) -> Result<Option<FileContent>, DomainError> {
        let key = self.normalize_path(path)?;
        Ok(self.state.files.delete(key))
    }

    pub fn files(&self) -> &FileTree {
        &self.state.files
    }

    pub fn files_mut(&mut self) -> &mut FileTree {
        &mut self.state.files
    }

    // ── manifest ──────────────────────────────────────────────────────────

    pub fn manifest(&self) -> &Manifest {
        &self.state.manifest
    }

    /// Merge `fields` into the manifest with default options.
    pub fn extend_package(&mut self, fields: Value) -> Result<(), DomainError> {
        let options = self.default_extend_options();
        self.extend_package_with_options(fields, options)
    }

    /// Merge fields computed from the current manifest.
    pub fn extend_package_with<F>(
        &mut self,
        options: ExtendOptions,
        fields: F,
    ) -> Result<(), DomainError>
    where
        F: FnOnce(&Manifest) -> Value,
    {
        let value = fields(&self.state.manifest);
        self.extend_package_with_options(value, options)
    }

    pub fn extend_package_with_options(
        &mut self,
        fields: Value,
        options: ExtendOptions,
    ) -> Result<(), DomainError> {
        let Value::Object(fields) = fields else {
            return Err(DomainError::InvalidManifest(
                "extend_package expects a JSON object".into(),
            ));
        };
        let diagnostics =
            self.state
                .manifest
                .extend(self.id, fields, options, &mut self.state.dep_sources);
        for d in diagnostics {
            self.report(d);
        }
        Ok(())
    }

    pub fn default_extend_options(&self) -> ExtendOptions {
        ExtendOptions {
            warn_incompatible_versions: self.env.settings.warn_incompatible_versions,
            ..ExtendOptions::default()
        }
    }

    // ── hooks ─────────────────────────────────────────────────────────────

    /// Rewrite the tree after every plugin has run.
    pub fn post_process_files<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut FileTree) -> Result<(), BoxError> + 'static,
    {
        self.state.post_process.push(self.id, callback);
    }

    /// Run after the tree is written, only for this invocation.
    pub fn after_invoke<F>(&mut self, callback: F)
    where
        F: FnOnce() -> Result<(), BoxError> + 'static,
    {
        self.state.after_invoke.push(self.id, callback);
    }

    pub fn on_create_complete<F>(&mut self, callback: F)
    where
        F: FnOnce() -> Result<(), BoxError> + 'static,
    {
        self.after_invoke(callback);
    }

    /// Run after the tree is written, whichever plugin was invoked.
    pub fn after_any_invoke<F>(&mut self, callback: F)
    where
        F: FnOnce() -> Result<(), BoxError> + 'static,
    {
        self.state.after_any_invoke.push(self.id, callback);
    }

    /// Queue a message shown once generation completes.
    pub fn exit_log(&mut self, message: impl Into<String>, severity: Severity) {
        self.state.exit_logs.push(ExitLogEntry {
            plugin_id: self.id.to_owned(),
            message: message.into(),
            severity,
        });
    }

    // ── plugins & versions ────────────────────────────────────────────────

    /// Whether `id` is active or installed, optionally at a version in `range`.
    pub fn has_plugin(&self, id: &str, version_range: Option<&str>) -> bool {
        let Some(full) = self
            .state
            .active_ids
            .iter()
            .chain(&self.state.all_plugin_ids)
            .find(|pid| matches_plugin_id(id, pid))
        else {
            return false;
        };

        let Some(range) = version_range else {
            return true;
        };
        let Some(range) = NodeRange::parse(range) else {
            warn!(plugin = %self.id, range, "has_plugin called with an invalid range");
            return false;
        };
        self.env
            .loader
            .installed_version(full, &self.state.context)
            .is_some_and(|v| range.satisfies(&v))
    }

    /// Fail unless the running tool satisfies `requirement`.
    ///
    /// Prereleases of the tool count as satisfying.
    pub fn assert_cli_version(
        &self,
        requirement: impl Into<CliVersionRequirement>,
    ) -> Result<(), DomainError> {
        let raw = match requirement.into() {
            CliVersionRequirement::Major(n) => format!("^{n}.0.0-0"),
            CliVersionRequirement::Range(r) => r,
        };
        let range = NodeRange::parse(&raw)
            .ok_or_else(|| DomainError::InvalidVersionRequirement(raw.clone()))?;
        if range.satisfies_including_prerelease(self.cli_version()) {
            return Ok(());
        }
        Err(DomainError::IncompatibleCliVersion {
            required: raw,
            actual: self.cli_version().to_string(),
        })
    }

    // ── generated code ────────────────────────────────────────────────────

    pub fn gen_js_config(&self, value: &JsValue) -> String {
        gen_js_config(value)
    }

    /// A config value emitted as raw JS.
    pub fn make_js_only_value(&self, expression: impl Into<String>) -> JsValue {
        JsValue::expression(expression)
    }

    /// Insert a loader binding into `file`, keeping bindings sorted.
    ///
    /// A failure leaves the file untouched and is reported as a diagnostic.
    pub fn inject_binding(&mut self, file: &str, snippet: &str) -> Result<(), MutationFailure> {
        self.mutate(file, |m, source| m.insert_binding(source, snippet))
    }

    /// Insert `entry` into an array argument in `file`.
    pub fn inject_list_entry(
        &mut self,
        file: &str,
        entry: &ListEntry,
    ) -> Result<(), MutationFailure> {
        self.mutate(file, |m, source| m.insert_list_entry(source, entry))
    }

    /// Insert a loader binding and a list entry that uses it. Either both
    /// land or `file` is left untouched.
    pub fn inject_list_entry_with_binding(
        &mut self,
        file: &str,
        snippet: &str,
        entry: &ListEntry,
    ) -> Result<(), MutationFailure> {
        self.mutate(file, |m, source| {
            let bound = m.insert_binding(source, snippet)?;
            m.insert_list_entry(&bound, entry)
        })
    }

    fn mutate<F>(&mut self, file: &str, op: F) -> Result<(), MutationFailure>
    where
        F: FnOnce(&SourceMutator<'_>, &str) -> Result<String, MutationFailure>,
    {
        let result = self.try_mutate(file, op);
        if let Err(failure) = &result {
            warn!(plugin = %self.id, file, %failure, "source mutation skipped");
            self.report(Diagnostic::warn(format!("{file}: {failure}")).attributed_to(self.id));
        }
        result
    }

    fn try_mutate<F>(&mut self, file: &str, op: F) -> Result<(), MutationFailure>
    where
        F: FnOnce(&SourceMutator<'_>, &str) -> Result<String, MutationFailure>,
    {
        let not_found = || MutationFailure::FileNotFound { path: file.into() };
        let key = self.normalize_path(file).map_err(|_| not_found())?;
        let source = self.state.files.get_text(&key).ok_or_else(not_found)?;

        let mutator = SourceMutator::new(self.env.parser, &self.env.settings.loader_function);
        let updated = op(&mutator, source)?;
        self.state.files.set(key, updated);
        Ok(())
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.env.diagnostics.emit(&diagnostic);
        self.state.diagnostics.push(diagnostic);
    }
}
