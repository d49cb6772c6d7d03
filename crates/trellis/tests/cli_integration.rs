//! End-to-end CLI integration tests.
//!
//! Every test points `--config` and `--data-dir` into a temporary directory
//! and disables the background update check, so nothing touches the network
//! or the user's real configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn trellis(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_trellis"));
    cmd.current_dir(dir)
        .env("TRELLIS_NO_UPDATE_CHECK", "1")
        .env_remove("TRELLIS_CONFIG")
        .env_remove("TRELLIS_DATA_DIR")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_path(dir))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

fn write_manifest(dir: &Path, manifest: &str) -> PathBuf {
    let path = dir.join("manifest.json");
    fs::write(&path, manifest).unwrap();
    path
}

const VALID_MANIFEST: &str = r#"{
    "name": "notes",
    "version": "1.2.0",
    "author": "Trellis Team",
    "description": "Take notes",
    "type": "external",
    "tier": "community",
    "license": "MIT",
    "minEngineVersion": "2.0.0",
    "downloads": [
        {"os": "linux", "arch": "amd64", "url": "https://example.com/notes-linux-amd64.tar.gz"}
    ]
}"#;

#[test]
fn test_help() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .arg("--help")
        .output()
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("plugin"))
        .stdout(predicate::str::contains("registry"))
        .stdout(predicate::str::contains("update"));
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .arg("--version")
        .output()
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::starts_with("trellis "));
}

#[test]
fn test_registry_list_defaults() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["registry", "list"])
        .output()
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("default [github] trellis-dev/trellis-registry@main"));

    assert!(!config_path(temp.path()).exists());
}

#[test]
fn test_registry_add_and_remove() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args([
            "registry", "add", "acme", "--owner", "acme", "--repo", "plugins", "--branch",
            "stable", "--priority", "-1",
        ])
        .output()
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("Added registry acme"));

    let saved = fs::read_to_string(config_path(temp.path())).unwrap();
    assert!(saved.contains("acme"));
    assert!(saved.contains("stable"));

    let output = trellis(temp.path())
        .args(["registry", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let acme = stdout.find("acme [github]").unwrap();
    let default = stdout.find("default [github]").unwrap();
    assert!(acme < default, "lower priority should be listed first");

    trellis(temp.path())
        .args(["registry", "remove", "acme"])
        .output()
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed registry acme"));

    let saved = fs::read_to_string(config_path(temp.path())).unwrap();
    assert!(!saved.contains("acme"));
}

#[test]
fn test_registry_add_duplicate_fails() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["registry", "add", "default", "--owner", "x", "--repo", "y"])
        .output()
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("default"));
}

#[test]
fn test_registry_remove_unknown_fails() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["registry", "remove", "missing"])
        .output()
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn test_registry_remove_last_fails() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["registry", "remove", "default"])
        .output()
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("only configured registry"));

    assert!(!config_path(temp.path()).exists());
}

#[test]
fn test_plugin_install_rejects_path_name() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["plugin", "install", "../x"])
        .output()
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid plugin name"));
}

#[test]
fn test_plugin_list_empty() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["plugin", "list"])
        .output()
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("No plugins installed."));
}

#[test]
fn test_plugin_remove_not_installed_fails() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["plugin", "remove", "notes"])
        .output()
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("notes"));
}

#[test]
fn test_plugin_validate_valid_manifest() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path(), VALID_MANIFEST);

    trellis(temp.path())
        .args(["plugin", "validate"])
        .arg(&manifest)
        .args(["--engine-version", "2.1.0", "--os", "linux", "--arch", "amd64"])
        .output()
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_plugin_validate_reports_every_error() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(
        temp.path(),
        r#"{"name": "notes", "version": "one", "type": "plugin", "tier": "core"}"#,
    );

    trellis(temp.path())
        .args(["plugin", "validate"])
        .arg(&manifest)
        .output()
        .unwrap()
        .assert()
        .failure()
        .stdout(predicate::str::contains("author: is required"))
        .stdout(predicate::str::contains("description: is required"))
        .stdout(predicate::str::contains("license: is required"))
        .stdout(predicate::str::contains("version: \"one\" is not a semantic version"))
        .stdout(predicate::str::contains("type: \"plugin\" must be one of"))
        .stderr(predicate::str::contains("failed validation with 5 error(s)"));
}

#[test]
fn test_plugin_validate_missing_target_platform() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path(), VALID_MANIFEST);

    trellis(temp.path())
        .args(["plugin", "validate"])
        .arg(&manifest)
        .args(["--os", "darwin", "--arch", "arm64"])
        .output()
        .unwrap()
        .assert()
        .failure()
        .stdout(predicate::str::contains("no download for target platform darwin/arm64"));
}

#[test]
fn test_plugin_validate_engine_too_old() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path(), VALID_MANIFEST);

    trellis(temp.path())
        .args(["plugin", "validate"])
        .arg(&manifest)
        .args(["--engine-version", "1.9.0"])
        .output()
        .unwrap()
        .assert()
        .failure()
        .stdout(predicate::str::contains("minEngineVersion"));
}

#[test]
fn test_plugin_validate_os_requires_arch() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path(), VALID_MANIFEST);

    trellis(temp.path())
        .args(["plugin", "validate"])
        .arg(&manifest)
        .args(["--os", "linux"])
        .output()
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn test_plugin_validate_malformed_json() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path(), "{ not json");

    trellis(temp.path())
        .args(["plugin", "validate"])
        .arg(&manifest)
        .output()
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}
