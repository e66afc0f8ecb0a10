//! `package.json` manifest source.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, instrument};

use stencil_core::application::ports::ManifestSource;
use stencil_core::domain::Manifest;
use stencil_core::error::{StencilError, StencilResult};

pub const MANIFEST_FILE: &str = "package.json";

/// Reads `package.json` from the project directory.
///
/// A manifest with `stencilPlugins.resolveFrom` is a pointer: the real
/// manifest is read from that directory, relative to the project.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonManifestSource;

impl JsonManifestSource {
    pub fn new() -> Self {
        Self
    }

    /// Directory the manifest is actually read from.
    pub fn resolve_from(context: &Path, manifest: &Manifest) -> Option<PathBuf> {
        manifest
            .get("stencilPlugins")
            .and_then(|v| v.get("resolveFrom"))
            .and_then(Value::as_str)
            .map(|dir| context.join(dir))
    }
}

impl ManifestSource for JsonManifestSource {
    #[instrument(skip_all, fields(context = %context.display()))]
    fn load(&self, context: &Path) -> StencilResult<Manifest> {
        let manifest = read_manifest(&context.join(MANIFEST_FILE))?;
        match Self::resolve_from(context, &manifest) {
            Some(dir) => {
                debug!(dir = %dir.display(), "manifest redirected");
                read_manifest(&dir.join(MANIFEST_FILE))
            }
            None => Ok(manifest),
        }
    }
}

fn read_manifest(path: &Path) -> StencilResult<Manifest> {
    let text = fs::read_to_string(path).map_err(|e| {
        StencilError::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    Manifest::parse(&text)
        .map_err(|e| StencilError::configuration(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_package_json() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{ "name": "demo", "devDependencies": { "@stencil/cli-plugin-eslint": "^0.1.0" } }"#,
        )
        .unwrap();

        let manifest = JsonManifestSource::new().load(temp.path()).unwrap();
        assert_eq!(manifest.name(), Some("demo"));
        assert_eq!(manifest.plugin_ids(), ["@stencil/cli-plugin-eslint"]);
    }

    #[test]
    fn follows_resolve_from() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("config")).unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{ "name": "outer", "stencilPlugins": { "resolveFrom": "config" } }"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("config").join(MANIFEST_FILE),
            r#"{ "name": "inner" }"#,
        )
        .unwrap();

        let manifest = JsonManifestSource::new().load(temp.path()).unwrap();
        assert_eq!(manifest.name(), Some("inner"));
    }

    #[test]
    fn missing_or_malformed_manifest_is_a_configuration_error() {
        let temp = TempDir::new().unwrap();
        let source = JsonManifestSource::new();

        let missing = source.load(temp.path()).unwrap_err();
        assert!(matches!(missing, StencilError::Configuration { .. }));

        fs::write(temp.path().join(MANIFEST_FILE), "{ not json").unwrap();
        let malformed = source.load(temp.path()).unwrap_err();
        assert!(matches!(malformed, StencilError::Configuration { .. }));
    }
}
