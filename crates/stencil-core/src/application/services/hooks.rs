//! Deferred callbacks registered by plugins.

use std::fmt;

use tracing::debug;

use crate::application::ApplicationError;
use crate::application::plugin::BoxError;
use crate::domain::FileTree;

type HookFn = Box<dyn FnOnce() -> Result<(), BoxError>>;
type PostProcessFn = Box<dyn FnOnce(&mut FileTree) -> Result<(), BoxError>>;

struct Hook {
    plugin_id: String,
    callback: HookFn,
}

/// FIFO queue of zero-argument callbacks run after the tree is written.
///
/// Queues are plain values: the generation service swaps them in and out
/// between protocol phases.
#[derive(Default)]
pub struct HookQueue {
    hooks: Vec<Hook>,
}

impl HookQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, plugin_id: impl Into<String>, callback: F)
    where
        F: FnOnce() -> Result<(), BoxError> + 'static,
    {
        self.hooks.push(Hook {
            plugin_id: plugin_id.into(),
            callback: Box::new(callback),
        });
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Ids of the registering plugins, in queue order.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|h| h.plugin_id.as_str())
    }

    /// Run every callback in registration order, stopping at the first error.
    pub fn run_all(self) -> Result<usize, ApplicationError> {
        let count = self.hooks.len();
        for hook in self.hooks {
            debug!(plugin = %hook.plugin_id, "running hook");
            (hook.callback)().map_err(|e| ApplicationError::HookFailed {
                plugin_id: hook.plugin_id.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(count)
    }
}

impl fmt::Debug for HookQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.owners()).finish()
    }
}

struct PostProcess {
    plugin_id: String,
    callback: PostProcessFn,
}

/// Callbacks that rewrite the tree before the manifest is finalized.
#[derive(Default)]
pub(crate) struct PostProcessQueue {
    callbacks: Vec<PostProcess>,
}

impl PostProcessQueue {
    pub(crate) fn push<F>(&mut self, plugin_id: impl Into<String>, callback: F)
    where
        F: FnOnce(&mut FileTree) -> Result<(), BoxError> + 'static,
    {
        self.callbacks.push(PostProcess {
            plugin_id: plugin_id.into(),
            callback: Box::new(callback),
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub(crate) fn run_all(self, files: &mut FileTree) -> Result<(), ApplicationError> {
        for pp in self.callbacks {
            (pp.callback)(files).map_err(|e| ApplicationError::PostProcessFailed {
                plugin_id: pp.plugin_id.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
