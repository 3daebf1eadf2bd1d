//! Tests for `cwldep clean`

use super::common::{host_dir, serve, TestContext};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use wiremock::MockServer;

#[tokio::test(flavor = "multi_thread")]
async fn test_clean_removes_unreferenced_dependency() {
    let server = MockServer::start().await;
    serve(&server, "/keep.cwl", b"class: Workflow\n").await;
    serve(&server, "/drop.cwl", b"class: CommandLineTool\n").await;

    let ctx = TestContext::new();
    let keep = format!("{}/keep.cwl", server.uri());
    let drop = format!("{}/drop.cwl", server.uri());
    ctx.write_document("main.cwl", &[&keep, &drop]);
    ctx.run(&["install", "main.cwl"]).await.assert().success();

    let host = host_dir(&server);
    let drop_key = format!("{}/drop.cwl", host);
    assert!(ctx.path(&drop_key).is_file());

    ctx.write_document("main.cwl", &[&keep]);

    // install keeps the orphan and points at clean
    ctx.run(&["install", "main.cwl"])
        .await
        .assert()
        .success()
        .stderr(predicate::str::contains("In lockfile but not referenced"))
        .stderr(predicate::str::contains("cwldep clean"));
    assert!(ctx.path(&drop_key).is_file());
    assert!(ctx.lockfile("main.cwl").get(&drop_key).is_some());

    ctx.run(&["clean", "main.cwl"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Removed: {}", drop_key)));

    assert!(!ctx.path(&drop_key).exists());
    assert!(ctx.path(&format!("{}/keep.cwl", host)).is_file());
    let lock = ctx.lockfile("main.cwl");
    assert!(lock.get(&drop_key).is_none());
    assert_eq!(lock.as_object().unwrap().len(), 1);
}
