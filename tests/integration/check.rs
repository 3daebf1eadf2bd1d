//! Tests for `cwldep check`

use super::common::{host_dir, serve, TestContext};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn test_check_before_install_reports_needs_install() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("class: Workflow\n"))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = TestContext::new();
    ctx.write_document("main.cwl", &[&format!("{}/a.cwl", server.uri())]);
    let before = ctx.snapshot();

    ctx.run(&["check", "main.cwl"])
        .await
        .assert()
        .code(2)
        .stdout(predicate::str::contains(format!(
            "Needs install: {}/a.cwl",
            host_dir(&server)
        )));

    assert_eq!(ctx.snapshot(), before);
    assert!(!ctx.path("main.cwl.dep.lock").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_after_install_is_clean() {
    let server = MockServer::start().await;
    serve(&server, "/a.cwl", b"class: Workflow\n").await;

    let ctx = TestContext::new();
    ctx.write_document("main.cwl", &[&format!("{}/a.cwl", server.uri())]);
    ctx.run(&["install", "main.cwl"]).await.assert().success();

    ctx.run(&["check", "main.cwl"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("All dependencies up to date"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reports_upstream_change_without_writing() {
    let server = MockServer::start().await;
    serve(&server, "/a.cwl", b"class: Workflow\n").await;

    let ctx = TestContext::new();
    ctx.write_document("main.cwl", &[&format!("{}/a.cwl", server.uri())]);
    ctx.run(&["install", "main.cwl"]).await.assert().success();

    server.reset().await;
    serve(&server, "/a.cwl", b"class: Workflow\nlabel: new\n").await;
    let before = ctx.snapshot();

    ctx.run(&["check", "main.cwl"])
        .await
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Upstream changed"));

    assert_eq!(ctx.snapshot(), before);
}
