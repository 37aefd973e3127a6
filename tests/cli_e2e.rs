//! End-to-end CLI tests for the kitscan binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn kitscan() -> Command {
    Command::cargo_bin("kitscan").unwrap()
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    kitscan()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("phishing-kit archives"))
        .stdout(predicate::str::contains("--download"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    kitscan()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kitscan"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    kitscan()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_out_of_range_concurrency_rejected() {
    kitscan().args(["-c", "0"]).assert().failure();
}

/// Empty piped input means no seeds and nothing to do.
#[test]
fn test_binary_empty_stdin_exits_cleanly() {
    kitscan()
        .arg("-q")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_binary_ignores_unparseable_seeds() {
    kitscan()
        .arg("-q")
        .write_stdin("not a url\nftp://files.test/kit.zip\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_prints_and_saves_matches_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kit.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(b"PK\x03\x04".to_vec()),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("kits");
    let seed = format!("{}/kit/login.php\n", server.uri());
    let expected = format!("{}/kit.zip\n", server.uri());
    let out_arg = out_dir.to_string_lossy().to_string();

    let assert = tokio::task::spawn_blocking(move || {
        kitscan()
            .args(["-q", "-d", "-c", "2", "-t", "5", "-o", &out_arg])
            .write_stdin(seed)
            .assert()
    })
    .await
    .unwrap();

    assert.success().stdout(predicate::str::diff(expected));

    let index = std::fs::read_to_string(out_dir.join("index.log")).unwrap();
    assert!(index.contains("/kit.zip : "), "index: {index}");
}
