//! Plugins compiled into the binary.
//!
//! - **base**: Express project skeleton
//! - **eslint**: lint config, scripts and dev dependencies
//! - **logger**: request logger spliced into the entry file

mod base;
mod eslint;
mod logger;

use std::sync::Arc;

use stencil_core::application::plugin::PluginGenerator;

pub use base::BasePlugin;
pub use eslint::EslintPlugin;
pub use logger::LoggerPlugin;

pub const BASE_ID: &str = "@stencil/cli-plugin-base";
pub const ESLINT_ID: &str = "@stencil/cli-plugin-eslint";
pub const LOGGER_ID: &str = "@stencil/cli-plugin-logger";

/// Entry file shared by the built-in plugins.
pub const ENTRY_FILE: &str = "src/index.js";

/// Short description shown by `stencil list`.
pub fn describe(id: &str) -> &'static str {
    match id {
        BASE_ID => "Express project skeleton",
        ESLINT_ID => "ESLint config and lint script",
        LOGGER_ID => "Request logging middleware",
        _ => "",
    }
}

pub fn all() -> Vec<(&'static str, Arc<dyn PluginGenerator>)> {
    vec![
        (BASE_ID, Arc::new(BasePlugin)),
        (ESLINT_ID, Arc::new(EslintPlugin::default())),
        (LOGGER_ID, Arc::new(LoggerPlugin)),
    ]
}
