//! Tests for `cwldep add`

use super::common::{host_dir, serve, TestContext};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use wiremock::MockServer;

#[tokio::test(flavor = "multi_thread")]
async fn test_add_records_and_installs() {
    let server = MockServer::start().await;
    serve(&server, "/tools/sort.cwl", b"class: CommandLineTool\n").await;

    let ctx = TestContext::new();
    fs::write(
        ctx.path("main.cwl"),
        "cwlVersion: v1.0\nclass: Workflow\ninputs: []\noutputs: []\nsteps: []\n",
    )
    .unwrap();

    let upstream = format!("{}/tools/sort.cwl", server.uri());
    ctx.run(&["add", "main.cwl", &upstream, "--install-to", "vendor"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Added"));

    let document = fs::read_to_string(ctx.path("main.cwl")).unwrap();
    assert!(document.contains(&upstream));
    assert!(document.contains("installTo: vendor"));
    assert!(document.contains("http://commonwl.org/cwldep#"));

    assert!(ctx.path("vendor/sort.cwl").is_file());
    assert!(ctx.lockfile("main.cwl").get("vendor/sort.cwl").is_some());
    // default location is unused with installTo
    assert!(!ctx.path(&host_dir(&server)).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_twice_updates_in_place() {
    let server = MockServer::start().await;
    serve(&server, "/a.cwl", b"class: Workflow\n").await;

    let ctx = TestContext::new();
    fs::write(
        ctx.path("main.cwl"),
        "cwlVersion: v1.0\nclass: Workflow\ninputs: []\noutputs: []\nsteps: []\n",
    )
    .unwrap();

    let upstream = format!("{}/a.cwl", server.uri());
    ctx.run(&["add", "main.cwl", &upstream]).await.assert().success();
    ctx.run(&["add", "main.cwl", &upstream, "--set-version", "v2"])
        .await
        .assert()
        .success();

    let document = fs::read_to_string(ctx.path("main.cwl")).unwrap();
    assert_eq!(document.matches(&upstream).count(), 1);
    assert!(document.contains("version: v2"));
}

#[test]
fn test_add_requires_upstream() {
    let ctx = TestContext::new();
    ctx.cwldep()
        .args(["add", "main.cwl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UPSTREAM"));
}
