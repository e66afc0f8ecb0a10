//! Dependency range merging.
//!
//! When several plugins touch the same dependency, [`merge_deps`] decides
//! which range survives. The function is pure: it reads the two maps and the
//! attribution table, and returns the merged map plus any diagnostics. It
//! never logs or prints on its own.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde_json::{Map, Value};

use crate::domain::diagnostics::Diagnostic;
use crate::domain::range::NodeRange;

const SEMVER_HINT: &str = "#semver:";

static GITHUB_SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+/[^/]+").expect("static regex"));

static URI_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:file|git|git\+ssh|git\+http|git\+https|git\+file|https?):")
        .expect("static regex")
});

/// Dependency name → id of the plugin that last set its range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepSources(BTreeMap<String, String>);

impl DepSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dependency: &str) -> Option<&str> {
        self.0.get(dependency).map(String::as_str)
    }

    pub fn set(&mut self, dependency: impl Into<String>, plugin_id: impl Into<String>) {
        self.0.insert(dependency.into(), plugin_id.into());
    }

    pub fn remove(&mut self, dependency: &str) -> Option<String> {
        self.0.remove(dependency)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Switches for a single merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Delete dependencies whose incoming range is `null`.
    pub prune: bool,
    /// Report ranges that do not overlap.
    pub warn_on_conflict: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            prune: false,
            warn_on_conflict: true,
        }
    }
}

/// Result of [`merge_deps`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub merged: Map<String, Value>,
    pub diagnostics: Vec<Diagnostic>,
}

/// `true` for npm ranges, `owner/repo` shorthands and URI references.
pub fn is_valid_range(range: &str) -> bool {
    NodeRange::is_valid(range) || GITHUB_SHORTHAND.is_match(range) || URI_SCHEME.is_match(range)
}

/// The semver-comparable part of a range: `git+https://x.git#semver:^1.0` → `^1.0`.
pub fn extract_semver(range: &str) -> &str {
    match range.rfind(SEMVER_HINT) {
        Some(i) if i > 0 => &range[i + SEMVER_HINT.len()..],
        _ => range,
    }
}

/// Put `semver` back into `range`, keeping any non-semver decoration.
pub fn inject_semver(range: &str, semver: &str) -> String {
    if NodeRange::is_valid(range) {
        return semver.to_owned();
    }
    match range.find(SEMVER_HINT) {
        Some(i) if range.len() > i + SEMVER_HINT.len() => {
            format!("{}{}{}", &range[..i], SEMVER_HINT, semver)
        }
        _ => range.to_owned(),
    }
}

/// Lowest version a range names: `^1.2.x` → `1.2.0`.
fn range_to_version(range: &str) -> Option<Version> {
    let stripped = range
        .strip_prefix(">=")
        .or_else(|| range.strip_prefix('>'))
        .or_else(|| range.strip_prefix('~'))
        .or_else(|| range.strip_prefix('^'))
        .unwrap_or(range);
    let stripped = stripped.replace('x', "0");
    let stripped = stripped.trim().trim_start_matches(['v', '=']);
    Version::parse(stripped).ok()
}

/// Pick the range with the greater floor, `None` when either is not a plain
/// `[~^>=]version`. Ties go to `incoming`.
pub fn try_get_newer_range<'a>(existing: &'a str, incoming: &'a str) -> Option<&'a str> {
    let a = range_to_version(existing)?;
    let b = range_to_version(incoming)?;
    Some(if a > b { existing } else { incoming })
}

/// Merge `incoming` ranges contributed by `owner` into `existing`.
pub fn merge_deps(
    owner: &str,
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
    sources: &mut DepSources,
    options: MergeOptions,
) -> MergeOutcome {
    let mut merged = existing.clone();
    let mut diagnostics = Vec::new();

    for (name, injecting) in incoming {
        let source = existing.get(name);

        // Same text: nothing to do, and non-semver ranges stay untouched.
        if source == Some(injecting) {
            continue;
        }

        if options.prune && injecting.is_null() {
            merged.remove(name);
            sources.remove(name);
            continue;
        }

        let Some(injecting) = injecting.as_str().filter(|r| is_valid_range(r)) else {
            diagnostics.push(
                Diagnostic::warn(format!(
                    "invalid dependency version range for \"{name}\":\n\n\
                     - {} injected by plugin \"{owner}\"",
                    display_range(injecting),
                ))
                .attributed_to(owner),
            );
            continue;
        };

        let source = source.and_then(Value::as_str).filter(|s| !s.is_empty());
        let Some(source) = source else {
            merged.insert(name.clone(), Value::String(injecting.to_owned()));
            sources.set(name.clone(), owner);
            continue;
        };

        let source_semver = extract_semver(source);
        let injecting_semver = extract_semver(injecting);
        let newer = try_get_newer_range(source_semver, injecting_semver);

        // Not comparable: the existing range is likely built in, keep it.
        let result = match newer {
            Some(r) => inject_semver(injecting, r),
            None => source.to_owned(),
        };

        let source_owner = sources.get(name).unwrap_or("project").to_owned();
        if result == injecting {
            sources.set(name.clone(), owner);
        }

        if options.warn_on_conflict && !ranges_compatible(source_semver, injecting_semver) {
            diagnostics.push(
                Diagnostic::warn(format!(
                    "conflicting dependency version ranges for \"{name}\":\n\n\
                     - {source} injected by plugin \"{source_owner}\"\n\
                     - {injecting} injected by plugin \"{owner}\"\n\n\
                     Using {}version ({result}), but this may cause build errors.",
                    if newer.is_some() { "newer " } else { "" },
                ))
                .attributed_to(owner),
            );
        }

        merged.insert(name.clone(), Value::String(result));
    }

    MergeOutcome {
        merged,
        diagnostics,
    }
}

fn ranges_compatible(a: &str, b: &str) -> bool {
    match (NodeRange::parse(a), NodeRange::parse(b)) {
        (Some(a), Some(b)) => a.intersects(&b),
        _ => false,
    }
}

fn display_range(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
