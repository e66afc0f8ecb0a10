//! The project manifest (`package.json`).

use serde_json::{Map, Value};

use crate::domain::deps::{DepSources, MergeOptions, merge_deps};
use crate::domain::diagnostics::Diagnostic;
use crate::domain::error::DomainError;
use crate::domain::plugin_id::is_plugin;

/// Keys that come first in a finalized manifest, in this order.
pub const CANONICAL_KEY_ORDER: &[&str] = &[
    "name",
    "version",
    "private",
    "description",
    "author",
    "scripts",
    "main",
    "module",
    "browser",
    "jsDelivr",
    "unpkg",
    "files",
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "babel",
    "eslintConfig",
    "prettier",
    "postcss",
    "browserslist",
    "jest",
];

const DEPENDENCY_FIELDS: &[&str] = &["dependencies", "devDependencies"];
const SORTED_FIELDS: &[&str] = &["dependencies", "devDependencies", "scripts"];

/// How [`Manifest::extend`] combines new fields with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendOptions {
    /// Remove `null` fields (recursively) after merging.
    pub prune: bool,
    /// Merge objects and arrays instead of replacing them.
    pub merge: bool,
    /// Report dependency ranges that do not overlap.
    pub warn_incompatible_versions: bool,
}

impl Default for ExtendOptions {
    fn default() -> Self {
        Self {
            prune: false,
            merge: true,
            warn_incompatible_versions: true,
        }
    }
}

/// A `package.json` object. Key order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest(Map<String, Value>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifest for a freshly created project.
    pub fn for_new_project<'a, I>(name: &str, dev_dependencies: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(name.to_owned()));
        map.insert("version".into(), Value::String("0.1.0".into()));
        map.insert("private".into(), Value::Bool(true));
        let dev: Map<String, Value> = dev_dependencies
            .into_iter()
            .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
            .collect();
        map.insert("devDependencies".into(), Value::Object(dev));
        Self(map)
    }

    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::InvalidManifest(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DomainError::InvalidManifest(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a field, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let value = self.0.get(key).cloned()?;
        self.0.retain(|k, _| k != key);
        Some(value)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Map stored under a dependency-style field, if it is an object.
    pub fn field_map(&self, field: &str) -> Option<&Map<String, Value>> {
        self.0.get(field).and_then(Value::as_object)
    }

    /// Range declared for `name` in `dependencies` or `devDependencies`.
    pub fn dependency_range(&self, name: &str) -> Option<&str> {
        DEPENDENCY_FIELDS
            .iter()
            .filter_map(|f| self.field_map(f))
            .find_map(|m| m.get(name))
            .and_then(Value::as_str)
    }

    /// Production then development dependency names.
    pub fn dependency_names(&self) -> Vec<String> {
        DEPENDENCY_FIELDS
            .iter()
            .filter_map(|f| self.field_map(f))
            .flat_map(|m| m.keys().cloned())
            .collect()
    }

    /// Dependency names that follow the plugin naming convention.
    pub fn plugin_ids(&self) -> Vec<String> {
        self.dependency_names()
            .into_iter()
            .filter(|id| is_plugin(id))
            .collect()
    }

    /// Whether either dependency table differs from `other`'s.
    pub fn dependencies_differ(&self, other: &Manifest) -> bool {
        DEPENDENCY_FIELDS
            .iter()
            .any(|f| self.field_map(f) != other.field_map(f))
    }

    /// Merge `fields` contributed by plugin `owner` into this manifest.
    ///
    /// `dependencies` and `devDependencies` objects go through the range
    /// resolver; all diagnostics it produces are returned.
    pub fn extend(
        &mut self,
        owner: &str,
        fields: Map<String, Value>,
        options: ExtendOptions,
        sources: &mut DepSources,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (key, value) in fields {
            let existing = self.0.get(&key);

            if DEPENDENCY_FIELDS.contains(&key.as_str()) && value.is_object() {
                let empty = Map::new();
                let current = existing.and_then(Value::as_object).unwrap_or(&empty);
                let incoming = value.as_object().unwrap_or(&empty);
                let outcome = merge_deps(
                    owner,
                    current,
                    incoming,
                    sources,
                    MergeOptions {
                        prune: options.prune,
                        warn_on_conflict: options.warn_incompatible_versions,
                    },
                );
                diagnostics.extend(outcome.diagnostics);
                self.0.insert(key, Value::Object(outcome.merged));
                continue;
            }

            let merged = match existing {
                Some(existing) if options.merge => merge_values(existing, value),
                _ => value,
            };
            self.0.insert(key, merged);
        }

        if options.prune {
            prune_nulls(&mut self.0);
        }

        diagnostics
    }

    /// Sort the dependency and script tables and apply the canonical key
    /// order. Idempotent.
    pub fn finalize(&mut self) {
        for field in SORTED_FIELDS {
            if let Some(Value::Object(map)) = self.0.get_mut(*field) {
                let mut entries: Vec<_> = std::mem::take(map).into_iter().collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                *map = entries.into_iter().collect();
            }
        }

        let mut rest: Vec<_> = std::mem::take(&mut self.0).into_iter().collect();
        let mut ordered = Map::new();
        for key in CANONICAL_KEY_ORDER {
            if let Some(pos) = rest.iter().position(|(k, _)| k == key) {
                let (k, v) = rest.remove(pos);
                ordered.insert(k, v);
            }
        }
        ordered.extend(rest);
        self.0 = ordered;
    }

    /// Two-space indented JSON with a trailing newline.
    pub fn to_json_string(&self) -> String {
        // A map of JSON values always serializes.
        let mut text = serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".into());
        text.push('\n');
        text
    }
}

impl From<Map<String, Value>> for Manifest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Combine a merged field with its previous value.
///
/// Arrays are concatenated without duplicates, objects are merged deeply,
/// anything else is replaced.
fn merge_values(existing: &Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Array(a), Value::Array(b)) => Value::Array(dedupe_concat(a, b)),
        (Value::Object(a), Value::Object(b)) => Value::Object(deep_merge(a, b)),
        (_, incoming) => incoming,
    }
}

fn deep_merge(existing: &Map<String, Value>, incoming: Map<String, Value>) -> Map<String, Value> {
    let mut out = existing.clone();
    for (key, value) in incoming {
        let merged = match out.get(&key) {
            Some(current) => merge_values(current, value),
            None => value,
        };
        out.insert(key, merged);
    }
    out
}

fn dedupe_concat(a: &[Value], b: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(a.len() + b.len());
    for v in a.iter().cloned().chain(b) {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn prune_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, v| !v.is_null());
    for value in map.values_mut() {
        if let Value::Object(inner) = value {
            prune_nulls(inner);
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(v: Value) -> Manifest {
        Manifest::from_value(v).unwrap()
    }

    fn fields(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn finalize_applies_canonical_order_then_arrival_order() {
        let mut m = manifest(json!({
            "zzz": 1,
            "dependencies": { "b": "1", "a": "1" },
            "custom": true,
            "name": "app",
            "scripts": { "test": "x", "build": "y" },
            "version": "0.1.0",
        }));
        m.finalize();

        let keys: Vec<_> = m.keys().collect();
        assert_eq!(keys, vec!["name", "version", "scripts", "dependencies", "zzz", "custom"]);
        let deps: Vec<_> = m.field_map("dependencies").unwrap().keys().collect();
        assert_eq!(deps, vec!["a", "b"]);
        let scripts: Vec<_> = m.field_map("scripts").unwrap().keys().collect();
        assert_eq!(scripts, vec!["build", "test"]);
    }

    #[test]
    fn finalize_does_not_invent_missing_tables() {
        let mut m = manifest(json!({ "name": "x" }));
        m.finalize();
        assert!(m.get("dependencies").is_none());
        assert!(m.get("scripts").is_none());
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut m = manifest(json!({
            "b": 1,
            "name": "x",
            "devDependencies": { "z": "1", "y": "2" }
        }));
        m.finalize();
        let once = m.to_json_string();
        m.finalize();
        assert_eq!(m.to_json_string(), once);
    }

    #[test]
    fn serializes_with_two_spaces_and_trailing_newline() {
        let m = manifest(json!({ "name": "x" }));
        assert_eq!(m.to_json_string(), "{\n  \"name\": \"x\"\n}\n");
    }

    #[test]
    fn extend_merges_arrays_and_objects() {
        let mut m = manifest(json!({
            "files": ["dist"],
            "eslintConfig": { "extends": ["a"], "root": true },
        }));
        let mut sources = DepSources::new();
        m.extend(
            "p",
            fields(json!({
                "files": ["dist", "lib"],
                "eslintConfig": { "extends": ["a", "b"], "env": { "node": true } },
            })),
            ExtendOptions::default(),
            &mut sources,
        );
        assert_eq!(m.get("files").unwrap(), &json!(["dist", "lib"]));
        assert_eq!(
            m.get("eslintConfig").unwrap(),
            &json!({ "extends": ["a", "b"], "root": true, "env": { "node": true } })
        );
    }

    #[test]
    fn extend_without_merge_replaces() {
        let mut m = manifest(json!({ "files": ["dist"] }));
        let mut sources = DepSources::new();
        m.extend(
            "p",
            fields(json!({ "files": ["lib"] })),
            ExtendOptions {
                merge: false,
                ..ExtendOptions::default()
            },
            &mut sources,
        );
        assert_eq!(m.get("files").unwrap(), &json!(["lib"]));
    }

    #[test]
    fn extend_routes_dependencies_through_resolver() {
        let mut m = manifest(json!({ "dependencies": { "react": "^17.0.0" } }));
        let mut sources = DepSources::new();
        sources.set("react", "plugin-1");
        let diags = m.extend(
            "plugin-2",
            fields(json!({ "dependencies": { "react": "^16.0.0", "axios": "^1.0.0" } })),
            ExtendOptions::default(),
            &mut sources,
        );
        assert_eq!(m.dependency_range("react"), Some("^17.0.0"));
        assert_eq!(m.dependency_range("axios"), Some("^1.0.0"));
        assert_eq!(diags.len(), 1);
        assert_eq!(sources.get("axios"), Some("plugin-2"));
    }

    #[test]
    fn prune_removes_nulls_recursively() {
        let mut m = manifest(json!({ "a": 1, "nested": { "x": 1, "y": 2 } }));
        let mut sources = DepSources::new();
        m.extend(
            "p",
            fields(json!({ "a": null, "nested": { "y": null } })),
            ExtendOptions {
                prune: true,
                ..ExtendOptions::default()
            },
            &mut sources,
        );
        assert!(m.get("a").is_none());
        assert_eq!(m.get("nested").unwrap(), &json!({ "x": 1 }));
    }

    #[test]
    fn plugin_ids_come_from_both_tables_in_order() {
        let m = manifest(json!({
            "dependencies": { "stencil-cli-plugin-a": "1", "express": "4" },
            "devDependencies": { "@stencil/cli-plugin-b": "1" },
        }));
        assert_eq!(m.plugin_ids(), vec!["stencil-cli-plugin-a", "@stencil/cli-plugin-b"]);
    }

    #[test]
    fn rejects_non_object_manifests() {
        assert!(Manifest::parse("[]").is_err());
        assert!(Manifest::parse("{ nope").is_err());
    }

    #[test]
    fn new_project_manifest_shape() {
        let m = Manifest::for_new_project("demo", [("@stencil/cli-plugin-base", "~0.1.0")]);
        assert_eq!(
            m.into_value(),
            json!({
                "name": "demo",
                "version": "0.1.0",
                "private": true,
                "devDependencies": { "@stencil/cli-plugin-base": "~0.1.0" },
            })
        );
    }
}
