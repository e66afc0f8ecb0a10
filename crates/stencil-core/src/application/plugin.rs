//! The plugin capability.
//!
//! A plugin contributes to a run through [`PluginGenerator::apply`]. It may
//! also expose [`PluginHooks`], which is called once for every installed
//! plugin (to collect `after_any_invoke` hooks) and again for active plugins
//! right after `apply`.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::application::services::GeneratorApi;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What plugin entry points return. Any error aborts the run.
pub type PluginResult = Result<(), BoxError>;

/// Options a plugin was invoked with.
pub type PluginOptions = Map<String, Value>;

pub trait PluginGenerator: Send + Sync {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &PluginOptions,
        invoking: bool,
    ) -> PluginResult;

    /// Optional hook registration slot.
    fn hooks(&self) -> Option<&dyn PluginHooks> {
        None
    }
}

pub trait PluginHooks: Send + Sync {
    fn register(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &PluginOptions,
        active_ids: &[String],
    ) -> PluginResult;
}

/// Adapts closures into a [`PluginGenerator`].
pub struct FnPlugin<F> {
    apply: F,
    hooks: Option<Box<dyn PluginHooks>>,
}

impl<F> FnPlugin<F>
where
    F: Fn(&mut GeneratorApi<'_>, &PluginOptions, bool) -> PluginResult + Send + Sync,
{
    pub fn new(apply: F) -> Self {
        Self { apply, hooks: None }
    }

    pub fn with_hooks<H>(mut self, hooks: H) -> Self
    where
        H: Fn(&mut GeneratorApi<'_>, &PluginOptions, &[String]) -> PluginResult
            + Send
            + Sync
            + 'static,
    {
        self.hooks = Some(Box::new(FnHooks(hooks)));
        self
    }
}

impl<F> PluginGenerator for FnPlugin<F>
where
    F: Fn(&mut GeneratorApi<'_>, &PluginOptions, bool) -> PluginResult + Send + Sync,
{
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &PluginOptions,
        invoking: bool,
    ) -> PluginResult {
        (self.apply)(api, options, invoking)
    }

    fn hooks(&self) -> Option<&dyn PluginHooks> {
        self.hooks.as_deref()
    }
}

struct FnHooks<H>(H);

impl<H> PluginHooks for FnHooks<H>
where
    H: Fn(&mut GeneratorApi<'_>, &PluginOptions, &[String]) -> PluginResult + Send + Sync,
{
    fn register(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &PluginOptions,
        active_ids: &[String],
    ) -> PluginResult {
        (self.0)(api, options, active_ids)
    }
}

/// An active plugin: identity, generator and options.
#[derive(Clone)]
pub struct Plugin {
    pub id: String,
    pub generator: Arc<dyn PluginGenerator>,
    pub options: PluginOptions,
}

impl Plugin {
    pub fn new(id: impl Into<String>, generator: Arc<dyn PluginGenerator>) -> Self {
        Self {
            id: id.into(),
            generator,
            options: PluginOptions::new(),
        }
    }

    pub fn with_options(mut self, options: PluginOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("has_hooks", &self.generator.hooks().is_some())
            .field("options", &self.options)
            .finish()
    }
}
