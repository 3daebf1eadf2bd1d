//! Tests for `cwldep install` and `cwldep update`

use super::common::{host_dir, serve, TestContext};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use wiremock::MockServer;

#[tokio::test(flavor = "multi_thread")]
async fn test_install_writes_lockfile() {
    let server = MockServer::start().await;
    serve(&server, "/tools/align.cwl", b"class: CommandLineTool\n").await;

    let ctx = TestContext::new();
    let upstream = format!("{}/tools/align.cwl", server.uri());
    ctx.write_document("main.cwl", &[&upstream]);

    ctx.run(&["install", "main.cwl"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("install complete"));

    let key = format!("{}/tools/align.cwl", host_dir(&server));
    assert_eq!(
        fs::read_to_string(ctx.path(&key)).unwrap(),
        "class: CommandLineTool\n"
    );

    let lock = ctx.lockfile("main.cwl");
    let entry = &lock[&key];
    assert_eq!(entry["upstream"], upstream.as_str());
    assert!(entry["checksum"].as_str().unwrap().starts_with("blake3:"));
    assert_eq!(entry["installed_to"][0], key.as_str());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_relocks_changed_upstream() {
    let server = MockServer::start().await;
    serve(&server, "/a.cwl", b"class: Workflow\n").await;

    let ctx = TestContext::new();
    ctx.write_document("main.cwl", &[&format!("{}/a.cwl", server.uri())]);
    ctx.run(&["install", "main.cwl"]).await.assert().success();
    let key = format!("{}/a.cwl", host_dir(&server));
    let before = ctx.lockfile("main.cwl")[&key]["checksum"].clone();

    server.reset().await;
    serve(&server, "/a.cwl", b"class: Workflow\nlabel: new\n").await;

    ctx.run(&["update", "main.cwl"])
        .await
        .assert()
        .success()
        .stderr(predicate::str::contains("Upstream has changed"));

    let after = ctx.lockfile("main.cwl")[&key]["checksum"].clone();
    assert_ne!(before, after);
    assert_eq!(
        fs::read_to_string(ctx.path(&key)).unwrap(),
        "class: Workflow\nlabel: new\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_install_reports_entry_errors() {
    let server = MockServer::start().await;
    serve(&server, "/ok.cwl", b"class: Workflow\n").await;

    let ctx = TestContext::new();
    ctx.write_document(
        "main.cwl",
        &["ftp://example.com/tool.cwl", &format!("{}/ok.cwl", server.uri())],
    );

    ctx.run(&["install", "main.cwl"])
        .await
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ftp://example.com/tool.cwl"));

    // the sibling still installed and was locked
    let lock = ctx.lockfile("main.cwl");
    assert!(lock
        .get(format!("{}/ok.cwl", host_dir(&server)))
        .is_some());
}

#[test]
fn test_install_missing_document() {
    let ctx = TestContext::new();

    ctx.cwldep()
        .args(["install", "missing.cwl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_help_lists_operations() {
    let ctx = TestContext::new();

    ctx.cwldep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("clean"));
}
