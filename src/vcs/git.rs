use crate::core::{CwldepError, CwldepResult};
use crate::di::VersionControl;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Version control through the system `git` binary
pub struct GitCli {
    git: Option<PathBuf>,
    timeout: Duration,
}

impl GitCli {
    /// Locate `git` on PATH; a missing binary surfaces when a command runs
    pub fn new(timeout: Duration) -> Self {
        Self {
            git: which::which("git").ok(),
            timeout,
        }
    }

    /// Run git with `args`, inside `cwd` when given, and return trimmed stdout
    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> CwldepResult<String> {
        let git = self
            .git
            .as_ref()
            .ok_or_else(|| CwldepError::Vcs("git not found on PATH".to_string()))?;

        let mut cmd = Command::new(git);
        cmd.args(args).kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        debug!("git {}", args.join(" "));

        let out = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                CwldepError::Vcs(format!(
                    "git {} timed out after {}s",
                    args.join(" "),
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| CwldepError::Vcs(format!("failed to execute git: {}", e)))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(CwldepError::Vcs(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }
}

fn path_arg(path: &Path) -> CwldepResult<&str> {
    path.to_str()
        .ok_or_else(|| CwldepError::Path(format!("Non UTF-8 path: {}", path.display())))
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repo(&self, upstream: &str, target: &Path) -> CwldepResult<()> {
        self.run(&["clone", upstream, path_arg(target)?], None).await?;
        Ok(())
    }

    async fn fetch_all(&self, checkout: &Path) -> CwldepResult<()> {
        self.run(&["fetch", "--all"], Some(checkout)).await?;
        Ok(())
    }

    async fn rev_parse(&self, checkout: &Path, rev: &str) -> CwldepResult<String> {
        self.run(&["rev-parse", rev], Some(checkout)).await
    }

    async fn checkout(&self, checkout: &Path, commit: &str) -> CwldepResult<()> {
        self.run(&["checkout", commit], Some(checkout)).await?;
        Ok(())
    }
}
