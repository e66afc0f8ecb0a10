//! Plugin identifier conventions.
//!
//! A plugin package is named one of:
//!
//! - `@stencil/cli-plugin-<name>` (official)
//! - `stencil-cli-plugin-<name>` (community)
//! - `@<scope>/stencil-cli-plugin-<name>` (scoped community)

use std::sync::LazyLock;

use regex::Regex;

static PLUGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@stencil/|stencil-|@[\w-]+(\.)?[\w-]+/stencil-)cli-plugin-")
        .expect("static regex")
});

static SCOPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@[\w-]+(\.)?[\w-]+/").expect("static regex"));

const OFFICIAL_SCOPE: &str = "@stencil/";
const PLUGIN_PREFIX: &str = "cli-plugin-";

/// `true` if `id` follows the plugin naming convention.
pub fn is_plugin(id: &str) -> bool {
    PLUGIN_RE.is_match(id)
}

/// Strip the convention prefix: `@stencil/cli-plugin-eslint` → `eslint`.
pub fn to_short_plugin_id(id: &str) -> String {
    PLUGIN_RE.replace(id, "").into_owned()
}

/// Whether a user-typed `input` refers to the full plugin id `full`.
///
/// `input` may be the full id, the short name, or a scoped short name
/// (`@acme/lint` matches `@acme/stencil-cli-plugin-lint`'s short form).
pub fn matches_plugin_id(input: &str, full: &str) -> bool {
    let short = to_short_plugin_id(full);
    full == input || short == input || short == SCOPE_RE.replace(input, "")
}

/// Expand a short id to the full package name.
pub fn resolve_plugin_id(id: &str) -> String {
    if is_plugin(id) {
        return id.to_owned();
    }
    if let Some(name) = id.strip_prefix(OFFICIAL_SCOPE) {
        return format!("{OFFICIAL_SCOPE}{PLUGIN_PREFIX}{name}");
    }
    if let Some(m) = SCOPE_RE.find(id) {
        let (scope, name) = id.split_at(m.end());
        return format!("{scope}stencil-{PLUGIN_PREFIX}{name}");
    }
    format!("stencil-{PLUGIN_PREFIX}{id}")
}
