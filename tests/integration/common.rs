//! Common utilities for integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn cwldep_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cwldep"))
}

/// Isolated workspace and config file for running cwldep
pub struct TestContext {
    pub temp: TempDir,
    pub workspace: PathBuf,
    pub config: PathBuf,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().join("work");
        fs::create_dir_all(&workspace).unwrap();
        let config = temp.path().join("config.yaml");
        fs::write(&config, "show_progress: false\nfetch_timeout_secs: 10\n").unwrap();
        Self {
            temp,
            workspace,
            config,
        }
    }

    /// cwldep running inside the workspace with the test config
    pub fn cwldep(&self) -> Command {
        let mut cmd = cwldep_command();
        cmd.current_dir(&self.workspace);
        cmd.env("CWLDEP_CONFIG", &self.config);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run cwldep on a blocking thread so mock servers on the test runtime
    /// keep answering
    pub async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = self.cwldep();
        cmd.args(args);
        tokio::task::spawn_blocking(move || cmd.output().unwrap())
            .await
            .unwrap()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.workspace.join(relative)
    }

    /// Write a workflow document whose `Dependencies` hint lists `upstreams`
    pub fn write_document(&self, name: &str, upstreams: &[&str]) -> PathBuf {
        let mut text = String::from(
            "cwlVersion: v1.0\nclass: Workflow\ninputs: []\noutputs: []\nsteps: []\n$namespaces:\n  dep: http://commonwl.org/cwldep#\nhints:\n  dep:Dependencies:\n",
        );
        if upstreams.is_empty() {
            text.push_str("    dependencies: []\n");
        } else {
            text.push_str("    dependencies:\n");
        }
        for upstream in upstreams {
            text.push_str(&format!("      - upstream: \"{}\"\n", upstream));
        }
        let document = self.path(name);
        fs::write(&document, text).unwrap();
        document
    }

    /// Parsed lockfile of `document` (name relative to the workspace)
    pub fn lockfile(&self, document: &str) -> serde_json::Value {
        let text = fs::read_to_string(self.path(&format!("{}.dep.lock", document))).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    /// Every path under the workspace, with file contents
    pub fn snapshot(&self) -> Vec<(PathBuf, Option<Vec<u8>>)> {
        let mut out = Vec::new();
        collect(&self.workspace, &mut out);
        out.sort();
        out
    }
}

fn collect(dir: &Path, out: &mut Vec<(PathBuf, Option<Vec<u8>>)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.push((path.clone(), None));
            collect(&path, out);
        } else {
            let content = fs::read(&path).unwrap();
            out.push((path, Some(content)));
        }
    }
}

/// Serve `body` for GET `route`
pub async fn serve(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// `host:port` of a mock server, the directory its artifacts install under
pub fn host_dir(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}
