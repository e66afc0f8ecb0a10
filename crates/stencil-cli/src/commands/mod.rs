//! Command handlers.
//!
//! Each handler translates parsed arguments into core requests, runs them,
//! and reports the result. No generation logic lives here.

pub mod completions;
pub mod create;
pub mod init;
pub mod invoke;
pub mod list;

use serde_json::{Map, Value};

use stencil_adapters::{LocalFilesystem, StaticPluginLoader, TreeSitterBackend};
use stencil_core::application::GenerationService;

use crate::{
    config::AppConfig,
    error::{CliError, CliResult},
    output::TerminalDiagnostics,
};

/// Wire the production adapters into a [`GenerationService`].
pub(crate) fn build_service(
    config: &AppConfig,
    sink: TerminalDiagnostics,
) -> CliResult<GenerationService> {
    let settings = config.generation_settings();
    let loader =
        StaticPluginLoader::with_builtins().with_bundled_version(settings.cli_version.clone());
    let backend = TreeSitterBackend::new().map_err(|e| CliError::Internal {
        message: format!("failed to load the TypeScript grammar: {e}"),
    })?;

    Ok(GenerationService::new(
        Box::new(loader),
        Box::new(LocalFilesystem::new()),
        Box::new(backend),
        Box::new(sink),
        settings,
    ))
}

/// Parse an `--options` argument. Absent means no options.
pub(crate) fn parse_options(raw: Option<&str>) -> CliResult<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::invalid_input("--options must be a JSON object")),
        Err(e) => Err(CliError::InvalidInput {
            message: format!("--options is not valid JSON: {e}"),
            source: Some(Box::new(e)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_options_are_empty() {
        assert!(parse_options(None).unwrap().is_empty());
    }

    #[test]
    fn object_options_are_kept() {
        let map = parse_options(Some(r#"{"prefix": "[api]"}"#)).unwrap();
        assert_eq!(map["prefix"], "[api]");
    }

    #[test]
    fn non_object_options_are_rejected() {
        assert!(matches!(
            parse_options(Some("[1, 2]")),
            Err(CliError::InvalidInput { .. })
        ));
        assert!(matches!(
            parse_options(Some("{nope")),
            Err(CliError::InvalidInput { .. })
        ));
    }

    #[test]
    fn service_builds_with_defaults() {
        let config = AppConfig::default();
        let sink = crate::output::OutputManager::new(
            &crate::cli::GlobalArgs {
                verbose: 0,
                quiet: true,
                no_color: true,
                config: None,
                log_file: None,
                output_format: crate::cli::OutputFormat::Plain,
            },
            &config,
        )
        .diagnostics();
        let service = build_service(&config, sink).unwrap();
        assert_eq!(service.settings().loader_function, "require");
    }
}
