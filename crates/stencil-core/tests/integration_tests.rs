//! Integration tests for stencil-core: the generation protocol against
//! mocked ports.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mockall::mock;
use semver::Version;
use serde_json::json;
use stencil_core::application::{ApplicationError, GenerationSettings};
use stencil_core::domain::MutationFailure;
use stencil_core::prelude::*;

mock! {
    pub Fs {}
    impl Filesystem for Fs {
        fn write_file(&self, path: &Path, content: &[u8]) -> StencilResult<()>;
        fn remove_file(&self, path: &Path) -> StencilResult<()>;
        fn exists(&self, path: &Path) -> bool;
        fn remove_dir_all(&self, path: &Path) -> StencilResult<()>;
    }
}

mock! {
    pub Loader {}
    impl PluginLoader for Loader {
        fn load_generator(&self, id: &str, context: &Path) -> Option<Arc<dyn PluginGenerator>>;
        fn installed_version(&self, id: &str, context: &Path) -> Option<Version>;
    }
}

mock! {
    pub Parser {}
    impl SyntaxBackend for Parser {
        fn parse(&self, source: &str) -> Result<stencil_core::domain::SyntaxTree, MutationFailure>;
    }
}

mock! {
    pub Sink {}
    impl DiagnosticsSink for Sink {
        fn emit(&self, diagnostic: &Diagnostic);
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Filesystem that accepts everything and records each call.
fn recording_fs(log: &Log) -> MockFs {
    let mut fs = MockFs::new();
    let writes = Arc::clone(log);
    fs.expect_write_file().returning(move |path, _| {
        writes.lock().unwrap().push(format!("write {}", path.display()));
        Ok(())
    });
    let removes = Arc::clone(log);
    fs.expect_remove_file().returning(move |path| {
        removes.lock().unwrap().push(format!("remove {}", path.display()));
        Ok(())
    });
    fs.expect_exists().return_const(true);
    fs
}

fn empty_loader() -> MockLoader {
    let mut loader = MockLoader::new();
    loader.expect_load_generator().returning(|_, _| None);
    loader.expect_installed_version().returning(|_, _| None);
    loader
}

fn quiet_sink() -> MockSink {
    let mut sink = MockSink::new();
    sink.expect_emit().return_const(());
    sink
}

fn unused_parser() -> MockParser {
    let mut parser = MockParser::new();
    parser.expect_parse().never();
    parser
}

fn service_with(fs: MockFs, loader: MockLoader, sink: MockSink) -> GenerationService {
    GenerationService::new(
        Box::new(loader),
        Box::new(fs),
        Box::new(unused_parser()),
        Box::new(sink),
        GenerationSettings {
            cli_version: Version::new(4, 5, 0),
            ..GenerationSettings::default()
        },
    )
}

fn plugin<F>(id: &str, apply: F) -> Plugin
where
    F: Fn(&mut GeneratorApi<'_>, &PluginOptions, bool) -> PluginResult + Send + Sync + 'static,
{
    Plugin::new(id, Arc::new(FnPlugin::new(apply)))
}

fn context() -> PathBuf {
    PathBuf::from("/work/app")
}

#[test]
fn conflicting_ranges_keep_the_newer_and_warn() {
    let writes = log();
    let service = service_with(recording_fs(&writes), empty_loader(), quiet_sink());

    let plugins = vec![
        plugin("plugin-1", |api, _, _| {
            api.extend_package(json!({ "dependencies": { "react": "^17.0.0" } }))?;
            Ok(())
        }),
        plugin("plugin-2", |api, _, _| {
            api.extend_package(json!({ "dependencies": { "react": "^16.0.0" } }))?;
            Ok(())
        }),
    ];

    let report = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins))
        .unwrap();

    assert_eq!(report.manifest.dependency_range("react"), Some("^17.0.0"));
    assert_eq!(report.dep_sources.get("react"), Some("plugin-1"));
    assert_eq!(report.diagnostics.len(), 1);
    let msg = &report.diagnostics[0].message;
    assert!(msg.contains("plugin-1") && msg.contains("plugin-2"));
    assert!(report.dependencies_changed);
}

#[test]
fn manifest_is_finalized_into_package_json() {
    let written = Arc::new(Mutex::new(Vec::<(PathBuf, Vec<u8>)>::new()));
    let mut fs = MockFs::new();
    let sink = Arc::clone(&written);
    fs.expect_write_file().returning(move |path, bytes| {
        sink.lock().unwrap().push((path.to_path_buf(), bytes.to_vec()));
        Ok(())
    });
    fs.expect_remove_file().never();

    let manifest = Manifest::from_value(json!({
        "devDependencies": { "b": "1.0.0", "a": "1.0.0" },
        "name": "x",
    }))
    .unwrap();
    let service = service_with(fs, empty_loader(), quiet_sink());
    let report = service
        .generate(GenerationRequest::new(context(), manifest, vec![]))
        .unwrap();

    assert_eq!(report.written, vec!["package.json".to_string()]);
    let written = written.lock().unwrap();
    assert_eq!(written[0].0, context().join("package.json"));
    assert_eq!(
        String::from_utf8(written[0].1.clone()).unwrap(),
        "{\n  \"name\": \"x\",\n  \"devDependencies\": {\n    \"a\": \"1.0.0\",\n    \"b\": \"1.0.0\"\n  }\n}\n"
    );
    assert!(!report.dependencies_changed);
}

#[test]
fn failing_plugin_aborts_before_any_write() {
    let mut fs = MockFs::new();
    fs.expect_write_file().never();
    fs.expect_remove_file().never();
    let service = service_with(fs, empty_loader(), quiet_sink());

    let plugins = vec![
        plugin("plugin-1", |api, _, _| {
            for name in ["a.js", "b.js", "c.js"] {
                api.write_file(name, "x")?;
            }
            Ok(())
        }),
        plugin("plugin-2", |_, _, _| Err("generator exploded".into())),
        plugin("plugin-3", |_, _, _| panic!("must not run")),
    ];

    let err = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins))
        .unwrap_err();
    assert_eq!(err.plugin_id(), Some("plugin-2"));
    assert!(matches!(
        err,
        StencilError::Application(ApplicationError::PluginInvocation { .. })
    ));
}

#[test]
fn full_tree_writes_every_file_and_deletes_nothing() {
    let mut fs = MockFs::new();
    // four plugin files plus package.json
    fs.expect_write_file().times(5).returning(|_, _| Ok(()));
    fs.expect_remove_file().never();
    let service = service_with(fs, empty_loader(), quiet_sink());

    let plugins = vec![plugin("p", |api, _, _| {
        for name in ["README.md", "src/index.js", "src\\lib\\util.js", ".gitignore"] {
            api.write_file(name, "content")?;
        }
        Ok(())
    })];
    let report = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins))
        .unwrap();

    assert!(report.written.contains(&"src/lib/util.js".to_string()));
    assert!(report.removed.is_empty());
    assert_eq!(report.changes.created.len(), 5);
}

#[test]
fn replacing_request_clears_the_directory_before_writing() {
    let calls = log();
    let mut fs = recording_fs(&calls);
    let clears = Arc::clone(&calls);
    fs.expect_remove_dir_all().times(1).returning(move |path| {
        clears.lock().unwrap().push(format!("clear {}", path.display()));
        Ok(())
    });
    let service = service_with(fs, empty_loader(), quiet_sink());

    let plugins = vec![plugin("p", |api, _, _| {
        api.write_file("a.js", "a")?;
        Ok(())
    })];
    service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins).replacing(true))
        .unwrap();

    let calls = entries(&calls);
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], "clear /work/app");
    assert!(calls[1..].iter().all(|c| c.starts_with("write ")));
}

#[test]
fn replacing_request_keeps_the_directory_when_a_plugin_fails() {
    let mut fs = MockFs::new();
    fs.expect_remove_dir_all().never();
    fs.expect_write_file().never();
    let service = service_with(fs, empty_loader(), quiet_sink());

    let plugins = vec![plugin("p", |_, _, _| Err("boom".into()))];
    let err = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins).replacing(true))
        .unwrap_err();

    assert_eq!(err.plugin_id(), Some("p"));
}

#[test]
fn tracked_tree_only_touches_changed_paths() {
    let calls = log();
    let service = service_with(recording_fs(&calls), empty_loader(), quiet_sink());

    let existing = FileTree::tracked([
        ("keep.js", "k"),
        ("edit.js", "e"),
        ("drop.js", "d"),
        ("package.json", "{}"),
    ]);
    let plugins = vec![plugin("p", |api, _, invoking| {
        assert!(invoking);
        api.write_file("edit.js", "e2")?;
        api.delete_file("drop.js")?;
        Ok(())
    })];

    let request = GenerationRequest::new(context(), Manifest::new(), plugins)
        .with_files(existing)
        .invoking(true);
    let report = service.generate(request).unwrap();

    let calls = entries(&calls);
    assert!(calls.contains(&"remove /work/app/drop.js".to_string()));
    assert!(calls.contains(&"write /work/app/edit.js".to_string()));
    assert!(!calls.iter().any(|c| c.ends_with("keep.js")));
    assert_eq!(report.changes.removed, vec!["drop.js"]);
    assert_eq!(report.changes.modified, vec!["edit.js", "package.json"]);
}

#[test]
fn hooks_are_isolated_and_run_after_the_write() {
    let events = log();

    // Installed, not active: only its after_any_invoke hook survives.
    let installed_events = Arc::clone(&events);
    let installed = FnPlugin::new(|_, _, _| Ok(())).with_hooks(move |api, options, active| {
        assert!(options.is_empty());
        assert_eq!(active, ["stencil-cli-plugin-active".to_string()]);
        let e = Arc::clone(&installed_events);
        api.after_any_invoke(move || {
            e.lock().unwrap().push("installed any".into());
            Ok(())
        });
        api.after_invoke(|| panic!("collection-pass after_invoke must be dropped"));
        Ok(())
    });
    let installed: Arc<dyn PluginGenerator> = Arc::new(installed);

    let mut loader = MockLoader::new();
    loader.expect_load_generator().returning(move |id, _| {
        (id == "stencil-cli-plugin-installed").then(|| Arc::clone(&installed))
    });

    let active_events = Arc::clone(&events);
    let active = FnPlugin::new(move |api, _, _| {
        let e = Arc::clone(&active_events);
        api.after_invoke(move || {
            e.lock().unwrap().push("active invoke".into());
            Ok(())
        });
        api.after_any_invoke(|| panic!("active-pass after_any_invoke must be dropped"));
        Ok(())
    });

    let mut seeded = HookQueue::new();
    let seeded_events = Arc::clone(&events);
    seeded.push("caller", move || {
        seeded_events.lock().unwrap().push("seeded".into());
        Ok(())
    });

    let manifest = Manifest::from_value(json!({
        "devDependencies": {
            "stencil-cli-plugin-installed": "^1.0.0",
            "stencil-cli-plugin-active": "^1.0.0",
        }
    }))
    .unwrap();
    let service = service_with(recording_fs(&events), loader, quiet_sink());
    let request = GenerationRequest::new(
        context(),
        manifest,
        vec![Plugin::new("stencil-cli-plugin-active", Arc::new(active))],
    )
    .with_after_invoke(seeded);
    let report = service.generate(request).unwrap();

    assert_eq!(report.hooks_run, 3);
    assert_eq!(
        entries(&events),
        vec![
            "write /work/app/package.json",
            "seeded",
            "active invoke",
            "installed any",
        ]
    );
}

#[test]
fn post_processing_runs_before_the_manifest_is_written() {
    let calls = log();
    let service = service_with(recording_fs(&calls), empty_loader(), quiet_sink());
    let plugins = vec![plugin("p", |api, _, _| {
        api.write_file("a.txt", "a")?;
        api.post_process_files(|files| {
            let upper = files.get_text("a.txt").unwrap_or_default().to_uppercase();
            files.set("a.txt", upper);
            files.set("b.txt", "b");
            Ok(())
        });
        Ok(())
    })];
    let report = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins))
        .unwrap();
    assert_eq!(report.written, vec!["a.txt", "b.txt", "package.json"]);
}

#[test]
fn post_processed_parent_paths_stay_inside_the_project() {
    let calls = log();
    let service = service_with(recording_fs(&calls), empty_loader(), quiet_sink());
    let plugins = vec![plugin("p", |api, _, _| {
        api.post_process_files(|files| {
            files.set("../../escape.txt", "x");
            Ok(())
        });
        Ok(())
    })];
    let report = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins))
        .unwrap();

    assert_eq!(report.written, vec!["escape.txt", "package.json"]);
    assert!(entries(&calls).contains(&"write /work/app/escape.txt".to_string()));
}

#[test]
fn exit_logs_are_flushed_with_short_ids() {
    let seen = Arc::new(Mutex::new(Vec::<Diagnostic>::new()));
    let mut sink = MockSink::new();
    let store = Arc::clone(&seen);
    sink.expect_emit()
        .returning(move |d| store.lock().unwrap().push(d.clone()));

    let service = service_with(recording_fs(&log()), empty_loader(), sink);
    let plugins = vec![plugin("@stencil/cli-plugin-eslint", |api, _, _| {
        api.exit_log("run npm run lint", Severity::Info);
        Ok(())
    })];
    let report = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins))
        .unwrap();

    assert_eq!(report.exit_logs.len(), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].plugin_id.as_deref(), Some("eslint"));
    assert_eq!(seen[0].severity, Severity::Info);
}

#[test]
fn plugin_and_version_queries() {
    let mut loader = MockLoader::new();
    loader.expect_load_generator().returning(|_, _| None);
    loader
        .expect_installed_version()
        .withf(|id, _| id == "@stencil/cli-plugin-eslint")
        .returning(|_, _| Some(Version::new(0, 3, 1)));

    let manifest = Manifest::from_value(json!({
        "devDependencies": { "@stencil/cli-plugin-eslint": "^0.3.0" }
    }))
    .unwrap();
    let service = service_with(recording_fs(&log()), loader, quiet_sink());
    let plugins = vec![plugin("stencil-cli-plugin-me", |api, _, _| {
        assert!(api.has_plugin("eslint", None));
        assert!(api.has_plugin("me", None));
        assert!(!api.has_plugin("router", None));
        assert!(api.has_plugin("eslint", Some("^0.3.0")));
        assert!(!api.has_plugin("eslint", Some(">=1")));

        api.assert_cli_version(4u64)?;
        api.assert_cli_version("^4.2.0")?;
        assert!(api.assert_cli_version(5u64).is_err());
        assert!(api.assert_cli_version("not a range").is_err());
        Ok(())
    })];
    service
        .generate(GenerationRequest::new(context(), manifest, plugins))
        .unwrap();
}

#[test]
fn paths_outside_the_project_are_rejected() {
    let service = service_with(recording_fs(&log()), empty_loader(), quiet_sink());
    let plugins = vec![plugin("p", |api, _, _| {
        assert!(api.write_file("../escape.txt", "x").is_err());
        assert!(api.write_file("/etc/passwd", "x").is_err());
        api.write_file("/work/app/inside.txt", "x")?;
        assert!(api.has_file("inside.txt"));
        Ok(())
    })];
    let report = service
        .generate(GenerationRequest::new(context(), Manifest::new(), plugins))
        .unwrap();
    assert!(report.written.contains(&"inside.txt".to_string()));
}
