//! CLI integration tests for Quay.
//!
//! These tests verify the full CLI workflow from project creation through building.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the quay binary command, isolated from the user's global config.
fn quay(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("quay").unwrap();
    cmd.env("HOME", home).env("QUAY_NO_COLOR", "1");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A library and an application that uses it.
fn app_with_library(root: &Path) {
    write(
        root,
        "Quay.toml",
        r#"[project]
name = "demo"

[[package]]
name = "lib"

[[package]]
name = "app"
dependencies = ["lib"]
"#,
    );
    write(root, "lib/greet.verse", "greet():void =\n    Print(\"hello\")\n");
    write(root, "app/main.verse", "using { lib }\nmain():void =\n    greet()\n");
}

// ============================================================================
// quay init
// ============================================================================

#[test]
fn test_init_creates_project() {
    let tmp = temp_dir();
    let project_dir = tmp.path().join("hello");

    quay(tmp.path())
        .args(["init", "hello"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(project_dir.join("Quay.toml").exists());
    assert!(project_dir.join("src/main.verse").exists());
    let manifest = fs::read_to_string(project_dir.join("Quay.toml")).unwrap();
    assert!(manifest.contains("name = \"hello\""));

    quay(tmp.path())
        .arg("build")
        .current_dir(&project_dir)
        .assert()
        .success();
}

#[test]
fn test_init_fails_if_manifest_exists() {
    let tmp = temp_dir();
    app_with_library(tmp.path());

    quay(tmp.path())
        .args(["init", "--name", "again"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ============================================================================
// quay build
// ============================================================================

#[test]
fn test_build_succeeds() {
    let tmp = temp_dir();
    app_with_library(tmp.path());

    quay(tmp.path())
        .args(["build", "--link", "require-complete"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished `demo`"));
}

#[test]
fn test_build_from_subdirectory() {
    let tmp = temp_dir();
    app_with_library(tmp.path());

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path().join("app"))
        .assert()
        .success();
}

#[test]
fn test_build_without_manifest_fails() {
    let tmp = temp_dir();

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Quay.toml`"));
}

#[test]
fn test_build_reports_syntax_error_with_location() {
    let tmp = temp_dir();
    app_with_library(tmp.path());
    write(tmp.path(), "app/broken.verse", "oops() =\n    call(\n");

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unclosed `(`"))
        .stderr(predicate::str::contains("app/broken.verse:2:9"))
        .stderr(predicate::str::contains("could not build `demo`"));
}

#[test]
fn test_build_reports_undeclared_dependency() {
    let tmp = temp_dir();
    app_with_library(tmp.path());
    write(tmp.path(), "lib/cycle.verse", "using { app }\n");

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not one of its dependencies"));
}

#[test]
fn test_require_complete_without_main_fails_to_link() {
    let tmp = temp_dir();
    write(
        tmp.path(),
        "Quay.toml",
        "[project]\nname = \"solo\"\n\n[[package]]\nname = \"lib\"\n",
    );
    write(tmp.path(), "lib/greet.verse", "greet() = 1\n");

    quay(tmp.path())
        .args(["build", "--link", "require-complete"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no `main` function"));

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .success();
}

#[test]
fn test_build_emits_listings_and_digests() {
    let tmp = temp_dir();
    app_with_library(tmp.path());

    quay(tmp.path())
        .args(["build", "--digests", "--emit", "out"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let listing = fs::read_to_string(tmp.path().join("out/app.qasm")).unwrap();
    assert!(listing.contains("app.main:"));
    assert!(tmp.path().join("out/program.qlink").exists());
    let digest =
        fs::read_to_string(tmp.path().join(".quay/target/digests/lib.digest.verse")).unwrap();
    assert!(digest.contains("greet()"));
}

#[test]
fn test_build_json_messages() {
    let tmp = temp_dir();
    app_with_library(tmp.path());

    let output = quay(tmp.path())
        .args(["build", "--message-format", "json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let last = events.last().unwrap();
    assert_eq!(last["reason"], "build-finished");
    assert_eq!(last["success"], true);
    assert!(events.iter().any(|e| e["reason"] == "stage-finished"));
}

#[test]
fn test_build_rejects_unknown_link_mode() {
    let tmp = temp_dir();
    app_with_library(tmp.path());

    quay(tmp.path())
        .args(["build", "--link", "sometimes"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid link mode"));
}

#[test]
fn test_project_config_sets_defaults() {
    let tmp = temp_dir();
    write(
        tmp.path(),
        "Quay.toml",
        "[project]\nname = \"solo\"\n\n[[package]]\nname = \"lib\"\n",
    );
    write(tmp.path(), "lib/greet.verse", "greet() = 1\n");
    write(tmp.path(), ".quay/config.toml", "[build]\nlink = \"require-complete\"\n");

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no `main` function"));
}

#[test]
fn test_manifest_syntax_error() {
    let tmp = temp_dir();
    write(tmp.path(), "Quay.toml", "[project\nname = \"broken\"\n");

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quay.toml"));
}

// ============================================================================
// quay check
// ============================================================================

#[test]
fn test_check_skips_code_generation() {
    let tmp = temp_dir();
    write(
        tmp.path(),
        "Quay.toml",
        "[project]\nname = \"solo\"\n\n[[package]]\nname = \"lib\"\n",
    );
    // A bodiless function only fails at IR generation.
    write(tmp.path(), "lib/stub.verse", "stub()\n");

    quay(tmp.path())
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .success();

    quay(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("function `stub` has no body"));
}

// ============================================================================
// quay tree
// ============================================================================

#[test]
fn test_tree_shows_packages_and_snippets() {
    let tmp = temp_dir();
    app_with_library(tmp.path());

    quay(tmp.path())
        .args(["tree", "--snippets"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("app (/demo/app, source) -> lib"))
        .stdout(predicate::str::contains("lib/greet.verse"));
}

#[test]
fn test_tree_dependency_order() {
    let tmp = temp_dir();
    write(
        tmp.path(),
        "Quay.toml",
        r#"[project]
name = "demo"

[[package]]
name = "app"
dependencies = ["lib"]

[[package]]
name = "lib"
"#,
    );
    fs::create_dir_all(tmp.path().join("app")).unwrap();
    fs::create_dir_all(tmp.path().join("lib")).unwrap();

    let output = quay(tmp.path())
        .args(["tree", "--dependency-order"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lib = stdout.find("lib (").unwrap();
    let app = stdout.find("app (").unwrap();
    assert!(lib < app);
}

// ============================================================================
// quay completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();
    quay(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quay"));
}
