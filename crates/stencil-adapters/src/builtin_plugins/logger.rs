use stencil_core::application::plugin::{PluginGenerator, PluginOptions, PluginResult};
use stencil_core::application::{GeneratorApi, ListEntry};

use super::ENTRY_FILE;

pub const MIDDLEWARE_FILE: &str = "src/middleware/logger.js";
pub const IMPORT: &str = "const createLogger = require('./middleware/logger');";
pub const DECLARATION: &str = "const logger = createLogger();";

fn middleware(prefix: &str) -> String {
    format!(
        "\
module.exports = function createLogger() {{
  return function logger(req, res, next) {{
    console.log(`{prefix} ${{req.method}} ${{req.url}}`);
    next();
  }};
}};
"
    )
}

/// Request logger wired into the entry file's middleware list.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerPlugin;

impl PluginGenerator for LoggerPlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &PluginOptions,
        _invoking: bool,
    ) -> PluginResult {
        let prefix = options
            .get("prefix")
            .and_then(|v| v.as_str())
            .unwrap_or("[http]");
        api.write_file(MIDDLEWARE_FILE, middleware(prefix))?;

        let entry = ListEntry::new("app", "use", "logger")
            .declared_by(DECLARATION)
            .after("jsonBody")
            .before("router");
        // Reported as a diagnostic; the entry file keeps its content.
        let _ = api.inject_list_entry_with_binding(ENTRY_FILE, IMPORT, &entry);
        Ok(())
    }
}
