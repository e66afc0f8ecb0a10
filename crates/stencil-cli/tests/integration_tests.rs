//! Integration tests for the `stencil` binary.

use std::fs;
use std::path::Path;

use assert_cmd::cargo;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// `stencil` running inside `dir`, isolated from the user's config and env.
fn stencil(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!("stencil");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("NO_COLOR")
        .env_remove("RUST_LOG");
    cmd
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_help_flag() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("invoke"));
}

#[test]
fn test_version_flag() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_list_table() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available Plugins"))
        .stdout(predicate::str::contains("@stencil/cli-plugin-eslint"))
        .stdout(predicate::str::contains("logger"));
}

#[test]
fn test_list_json_is_parseable() {
    let temp = TempDir::new().unwrap();
    let output = stencil(temp.path())
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["base", "eslint", "logger"]);
}

#[test]
fn test_quiet_table_prints_nothing() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .args(["-q", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_create_project_with_plugins() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .args(["create", "demo", "-p", "eslint", "-p", "logger"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project 'demo' created"))
        .stdout(predicate::str::contains("npm install"));

    let root = temp.path().join("demo");
    for file in [
        ".eslintrc.js",
        ".gitignore",
        "README.md",
        "package.json",
        "src/index.js",
        "src/middleware/logger.js",
        "src/router.js",
    ] {
        assert!(root.join(file).is_file(), "missing {file}");
    }

    let manifest = read_json(&root.join("package.json"));
    assert_eq!(manifest["name"], "demo");
    let version = format!("~{}", env!("CARGO_PKG_VERSION"));
    assert_eq!(manifest["devDependencies"]["@stencil/cli-plugin-base"], version.as_str());
    assert_eq!(manifest["devDependencies"]["@stencil/cli-plugin-logger"], version.as_str());
    assert!(manifest["scripts"]["lint"].is_string());

    let entry = fs::read_to_string(root.join("src/index.js")).unwrap();
    assert!(entry.contains("const createLogger = require('./middleware/logger');"));
    assert!(entry.contains("app.use([jsonBody, logger, router]);"));
}

#[test]
fn test_create_with_plugin_options() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .args([
            "create",
            "demo",
            "--plugin",
            "logger",
            "--options",
            r#"{"logger": {"prefix": "[api]"}}"#,
        ])
        .assert()
        .success();

    let logger = fs::read_to_string(temp.path().join("demo/src/middleware/logger.js")).unwrap();
    assert!(logger.contains("[api]"));
}

#[test]
fn test_create_json_summary() {
    let temp = TempDir::new().unwrap();
    let output = stencil(temp.path())
        .args(["--output-format", "json", "create", "demo"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["project"], "demo");
    assert_eq!(summary["plugins"][0], "@stencil/cli-plugin-base");
    assert!(
        summary["written"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f == "package.json")
    );
}

#[test]
fn test_force_overwrites_existing_directory() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("demo");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("stale.txt"), "old").unwrap();

    stencil(temp.path())
        .args(["create", "demo", "--force"])
        .assert()
        .success();

    assert!(!root.join("stale.txt").exists());
    assert!(root.join("package.json").is_file());
}

#[test]
fn test_invoke_plugin_in_existing_project() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .args(["create", "demo", "-p", "eslint"])
        .assert()
        .success();

    stencil(temp.path())
        .args(["invoke", "eslint", "--dir", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoked 'eslint'"));

    assert!(temp.path().join("demo/.eslintrc.js").is_file());
}

#[test]
fn test_reinvoking_logger_leaves_entry_unchanged() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .args(["create", "demo", "-p", "logger"])
        .assert()
        .success();
    let entry = temp.path().join("demo/src/index.js");
    let before = fs::read_to_string(&entry).unwrap();

    stencil(temp.path())
        .args(["invoke", "logger", "--dir", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No files changed"))
        .stderr(predicate::str::contains("already declared"));

    assert_eq!(fs::read_to_string(&entry).unwrap(), before);
}

#[test]
fn test_init_writes_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("conf/stencil.toml");

    stencil(temp.path())
        .args(["init", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration created"));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[generation]"));

    // The written file is a valid config for later runs.
    stencil(temp.path())
        .args(["list", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stencil.toml");
    fs::write(&path, "# mine\n").unwrap();

    stencil(temp.path())
        .args(["init", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");
}

#[test]
fn test_completions_bash() {
    let temp = TempDir::new().unwrap();
    stencil(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stencil"));
}
