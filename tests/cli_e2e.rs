//! End-to-end CLI tests for the commons-sampler binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::fake_commons::{API_PATH, FakeFile, mount_files, mount_search, read_manifest};
use support::socket_guard::start_mock_server_or_skip;

/// Command with an isolated config home so a developer's config file never
/// leaks into the test.
fn sampler_cmd(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("commons-sampler").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}

fn write_categories(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("categories.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_binary_help_lists_flags() {
    let temp = TempDir::new().unwrap();
    sampler_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--per-category"))
        .stdout(predicate::str::contains("--seed"))
        .stdout(predicate::str::contains("--sleep"))
        .stdout(predicate::str::contains("--out"));
}

#[test]
fn test_binary_version() {
    let temp = TempDir::new().unwrap();
    sampler_cmd(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_binary_invalid_flag_fails() {
    let temp = TempDir::new().unwrap();
    sampler_cmd(temp.path())
        .arg("--no-such-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--no-such-flag"));
}

#[test]
fn test_binary_rejects_sleep_above_cap() {
    let temp = TempDir::new().unwrap();
    sampler_cmd(temp.path())
        .args(["--sleep", "1e20"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--sleep"));
}

#[test]
fn test_binary_rejects_bad_config_file() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("commons-sampler");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "per_category = 0\n").unwrap();

    sampler_cmd(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("per_category"));
}

#[test]
fn test_binary_rejects_bad_categories_file() {
    let temp = TempDir::new().unwrap();
    let categories = write_categories(temp.path(), "Bad Key = \"x\"\n");

    sampler_cmd(temp.path())
        .arg("--categories")
        .arg(&categories)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load categories"));
}

#[tokio::test]
async fn test_binary_full_run_writes_folders_and_manifest() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let titles = vec![
        "File:Pothole A.jpg".to_string(),
        "File:Pothole B.png".to_string(),
        "File:Pothole C.jpg".to_string(),
    ];
    let files: Vec<FakeFile> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| FakeFile::image(&server, title, &format!("p{i}.jpg")))
        .collect();
    mount_search(&server, "pothole road", titles).await;
    mount_files(&server, &files).await;

    let temp = TempDir::new().unwrap();
    let out = temp.path().join("samples");
    let categories = write_categories(temp.path(), "pothole = \"pothole road\"\n");

    sampler_cmd(temp.path())
        .arg("--api-url")
        .arg(format!("{}{API_PATH}", server.uri()))
        .arg("--categories")
        .arg(&categories)
        .arg("--out")
        .arg(&out)
        .args(["--per-category", "2", "--sleep", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("== pothole :: 'pothole road' =="))
        .stdout(predicate::str::contains("Found 3 candidate images; selected 2"))
        .stdout(predicate::str::contains("downloading 01/2 -> 01_"))
        .stdout(predicate::str::contains("Done. Downloaded ~2 images into:"))
        .stdout(predicate::str::contains("Manifest:"));

    let rows = read_manifest(&out.join("manifest.csv"));
    assert_eq!(rows.len(), 2);
    assert_eq!(std::fs::read_dir(out.join("pothole")).unwrap().count(), 2);

    // Second run finds everything on disk.
    sampler_cmd(temp.path())
        .arg("--api-url")
        .arg(format!("{}{API_PATH}", server.uri()))
        .arg("--categories")
        .arg(&categories)
        .arg("--out")
        .arg(&out)
        .args(["--per-category", "2", "--sleep", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skip exists: 01_"));
}

#[tokio::test]
async fn test_binary_quiet_suppresses_progress() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, "pothole road", Vec::new()).await;

    let temp = TempDir::new().unwrap();
    let categories = write_categories(temp.path(), "pothole = \"pothole road\"\n");

    sampler_cmd(temp.path())
        .arg("--api-url")
        .arg(format!("{}{API_PATH}", server.uri()))
        .arg("--categories")
        .arg(&categories)
        .arg("--out")
        .arg(temp.path().join("out"))
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(temp.path().join("out").join("manifest.csv").exists());
}

#[tokio::test]
async fn test_binary_warns_on_each_api_retry() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let categories = write_categories(temp.path(), "pothole = \"pothole road\"\n");

    let output = sampler_cmd(temp.path())
        .arg("--api-url")
        .arg(format!("{}{API_PATH}", server.uri()))
        .arg("--categories")
        .arg(&categories)
        .arg("--out")
        .arg(temp.path().join("out"))
        .args(["-r", "2"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("retrying").count(),
        1,
        "two attempts give exactly one retry warning:\n{stderr}"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_binary_exhausted_api_retries_exit_non_zero() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let categories = write_categories(temp.path(), "pothole = \"pothole road\"\n");

    sampler_cmd(temp.path())
        .arg("--api-url")
        .arg(format!("{}{API_PATH}", server.uri()))
        .arg("--categories")
        .arg(&categories)
        .arg("--out")
        .arg(temp.path().join("out"))
        .args(["-r", "1", "-q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sampling run aborted"));

    assert!(!temp.path().join("out").join("manifest.csv").exists());
}
