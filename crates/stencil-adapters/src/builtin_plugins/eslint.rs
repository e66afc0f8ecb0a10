use serde_json::json;
use tracing::info;

use stencil_core::application::plugin::{
    PluginGenerator, PluginHooks, PluginOptions, PluginResult,
};
use stencil_core::application::GeneratorApi;
use stencil_core::domain::{JsValue, Severity};

const CONFIG_FILE: &str = ".eslintrc.js";

/// ESLint config, `lint` script and dev dependency.
#[derive(Debug, Clone, Default)]
pub struct EslintPlugin {
    hooks: EslintHooks,
}

impl PluginGenerator for EslintPlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &PluginOptions,
        invoking: bool,
    ) -> PluginResult {
        let config = config(api, options);
        let source = api.gen_js_config(&config);
        api.write_file(CONFIG_FILE, source)?;

        api.extend_package(json!({
            "scripts": { "lint": "eslint src" },
            "devDependencies": { "eslint": "^8.57.0" }
        }))?;

        if invoking {
            api.exit_log("ESLint config updated", Severity::Done);
        } else {
            api.on_create_complete(|| {
                info!("eslint ready, run `npm run lint`");
                Ok(())
            });
        }
        api.exit_log("Run `npm run lint` to check your code", Severity::Info);
        Ok(())
    }

    fn hooks(&self) -> Option<&dyn PluginHooks> {
        Some(&self.hooks)
    }
}

fn config(api: &GeneratorApi<'_>, options: &PluginOptions) -> JsValue {
    let mut rules = Vec::new();
    // The logger middleware writes to stdout on purpose.
    if api.has_plugin("logger", None) {
        rules.push(("no-console", JsValue::from("off")));
    }
    if let Some(extra) = options.get("rules").and_then(|v| v.as_object()) {
        rules.extend(extra.iter().map(|(k, v)| (k.as_str(), JsValue::from(v.clone()))));
    }

    JsValue::object([
        ("root", JsValue::from(true)),
        (
            "env",
            JsValue::object([("node", JsValue::from(true)), ("es2022", JsValue::from(true))]),
        ),
        ("extends", JsValue::Array(vec!["eslint:recommended".into()])),
        (
            "parserOptions",
            JsValue::object([("ecmaVersion", api.make_js_only_value("'latest'"))]),
        ),
        ("rules", JsValue::object(rules)),
    ])
}

/// Reminds to lint after any plugin touched the project.
#[derive(Debug, Clone, Copy, Default)]
struct EslintHooks;

impl PluginHooks for EslintHooks {
    fn register(
        &self,
        api: &mut GeneratorApi<'_>,
        _options: &PluginOptions,
        active_ids: &[String],
    ) -> PluginResult {
        let invoked = active_ids.join(", ");
        api.after_any_invoke(move || {
            info!(plugins = %invoked, "files changed, consider running `npm run lint`");
            Ok(())
        });
        Ok(())
    }
}
