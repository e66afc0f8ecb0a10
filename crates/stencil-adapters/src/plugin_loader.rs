//! Static plugin registry.
//!
//! Plugins are compiled into the binary and looked up by their full package
//! id. Installed versions come from the project's `node_modules`, falling
//! back to the bundled version for registered plugins.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

use stencil_core::application::plugin::PluginGenerator;
use stencil_core::application::ports::PluginLoader;
use stencil_core::domain::{matches_plugin_id, to_short_plugin_id};

use crate::builtin_plugins;

#[derive(Debug, Deserialize)]
struct InstalledPackage {
    version: String,
}

#[derive(Clone, Default)]
pub struct StaticPluginLoader {
    plugins: BTreeMap<String, Arc<dyn PluginGenerator>>,
    bundled_version: Option<Version>,
}

impl StaticPluginLoader {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin.
    pub fn with_builtins() -> Self {
        let mut loader = Self::new();
        for (id, generator) in builtin_plugins::all() {
            loader.register(id, generator);
        }
        loader
    }

    /// Version reported for registered plugins missing from `node_modules`.
    pub fn with_bundled_version(mut self, version: Version) -> Self {
        self.bundled_version = Some(version);
        self
    }

    pub fn register(&mut self, id: impl Into<String>, generator: Arc<dyn PluginGenerator>) {
        let id = id.into();
        debug!(plugin = %id, "registering plugin");
        self.plugins.insert(id, generator);
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Full id of the registered plugin a user-typed name refers to.
    pub fn find(&self, input: &str) -> Option<&str> {
        self.ids().find(|id| matches_plugin_id(input, id))
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn PluginGenerator>> {
        self.plugins.get(id).cloned()
    }
}

impl std::fmt::Debug for StaticPluginLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticPluginLoader")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("bundled_version", &self.bundled_version)
            .finish()
    }
}

impl PluginLoader for StaticPluginLoader {
    fn load_generator(&self, id: &str, _context: &Path) -> Option<Arc<dyn PluginGenerator>> {
        self.get(id)
    }

    fn installed_version(&self, id: &str, context: &Path) -> Option<Version> {
        let path = context.join("node_modules").join(id).join("package.json");
        match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<InstalledPackage>(&text)
                .ok()
                .and_then(|pkg| Version::parse(&pkg.version).ok())
            {
                Some(version) => Some(version),
                None => {
                    warn!(
                        plugin = %to_short_plugin_id(id),
                        path = %path.display(),
                        "unreadable installed version"
                    );
                    None
                }
            },
            Err(_) if self.plugins.contains_key(id) => self.bundled_version.clone(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtins_are_registered_under_full_ids() {
        let loader = StaticPluginLoader::with_builtins();
        let ids: Vec<&str> = loader.ids().collect();
        assert_eq!(
            ids,
            [
                "@stencil/cli-plugin-base",
                "@stencil/cli-plugin-eslint",
                "@stencil/cli-plugin-logger"
            ]
        );
        assert_eq!(loader.find("eslint"), Some("@stencil/cli-plugin-eslint"));
        assert!(loader.find("prettier").is_none());
        assert!(
            loader
                .load_generator("@stencil/cli-plugin-logger", Path::new("."))
                .is_some()
        );
    }

    #[test]
    fn installed_version_prefers_node_modules() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("node_modules/@stencil/cli-plugin-eslint");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), r#"{ "version": "0.3.1" }"#).unwrap();

        let loader =
            StaticPluginLoader::with_builtins().with_bundled_version(Version::new(9, 0, 0));

        assert_eq!(
            loader.installed_version("@stencil/cli-plugin-eslint", temp.path()),
            Some(Version::new(0, 3, 1))
        );
        assert_eq!(
            loader.installed_version("@stencil/cli-plugin-base", temp.path()),
            Some(Version::new(9, 0, 0))
        );
        assert_eq!(
            loader.installed_version("stencil-cli-plugin-unknown", temp.path()),
            None
        );
    }
}
