use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn lit_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("lit");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/litfeed.sqlite"

[sources]
"The Gerontologist" = "S151833132"
"Health & Place" = "S108842106"

[retrieval]
default_threshold = 0.3

[server]
bind = "127.0.0.1:7411"
"#,
        root.display()
    );

    let config_path = config_dir.join("litfeed.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_lit(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lit_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lit binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lit(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_lit(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_lit(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_sources_lists_subscriptions() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_lit(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("The Gerontologist"));
    assert!(stdout.contains("S151833132"));
    assert!(stdout.contains("Health & Place"));
}

#[test]
fn test_feed_on_empty_corpus() {
    let (_tmp, config_path) = setup_test_env();

    run_lit(&config_path, &["init"]);
    let (stdout, stderr, success) = run_lit(&config_path, &["feed"]);
    assert!(success, "feed failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No records."));
}

#[test]
fn test_read_unknown_doi_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_lit(&config_path, &["init"]);
    let (_, stderr, success) = run_lit(&config_path, &["read", "10.1/ghost"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_feed_rejects_invalid_threshold() {
    let (_tmp, config_path) = setup_test_env();

    run_lit(&config_path, &["init"]);
    let (_, stderr, success) = run_lit(&config_path, &["feed", "falls", "--threshold", "2.0"]);
    assert!(!success);
    assert!(stderr.contains("threshold"));
}

#[test]
fn test_missing_config_fails() {
    let (tmp, _) = setup_test_env();
    let bogus = tmp.path().join("missing.toml");

    let binary = lit_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(bogus.to_str().unwrap())
        .arg("init")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
