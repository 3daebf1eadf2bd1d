//! Mock implementations of service traits for testing

use super::traits::{ConfigProvider, VersionControl};
use crate::core::{CwldepError, CwldepResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock configuration provider for testing
///
/// # Example
///
/// ```
/// use cwldep::di::mocks::MockConfigProvider;
/// use cwldep::di::ConfigProvider;
///
/// let mut config = MockConfigProvider::default();
/// config.checksum_algorithm = "sha256".to_string();
///
/// assert_eq!(config.checksum_algorithm(), "sha256");
/// assert!(!config.show_progress());
/// ```
#[derive(Clone)]
pub struct MockConfigProvider {
    pub checksum_algorithm: String,
    pub fetch_timeout: Duration,
    pub vcs_timeout: Duration,
    pub user_agent: String,
    pub show_progress: bool,
}

impl Default for MockConfigProvider {
    fn default() -> Self {
        Self {
            checksum_algorithm: "blake3".to_string(),
            fetch_timeout: Duration::from_secs(10),
            vcs_timeout: Duration::from_secs(10),
            user_agent: "cwldep-test".to_string(),
            show_progress: false,
        }
    }
}

impl ConfigProvider for MockConfigProvider {
    fn checksum_algorithm(&self) -> &str {
        &self.checksum_algorithm
    }

    fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    fn vcs_timeout(&self) -> Duration {
        self.vcs_timeout
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn show_progress(&self) -> bool {
        self.show_progress
    }
}

/// A remote repository known to [`MockVersionControl`]
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    /// Commit the default branch points at
    pub default_head: String,
    /// Branch or tag name -> commit id
    pub refs: HashMap<String, String>,
    /// Every commit id that exists in the remote
    pub commits: Vec<String>,
}

#[derive(Default)]
struct MockVcsState {
    remotes: HashMap<String, MockRemote>,
    // checkout dir -> (upstream, HEAD)
    checkouts: HashMap<PathBuf, (String, String)>,
    calls: Vec<String>,
}

/// Mock version control for testing
///
/// Keeps repository state in memory. Cloning creates `<target>/.git` on
/// disk so callers that look for an existing checkout behave as with git.
#[derive(Clone, Default)]
pub struct MockVersionControl {
    state: Arc<Mutex<MockVcsState>>,
}

impl MockVersionControl {
    /// Create a new mock with no remotes
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a remote repository
    pub fn add_remote(&self, upstream: &str, remote: MockRemote) {
        self.state
            .lock()
            .unwrap()
            .remotes
            .insert(upstream.to_string(), remote);
    }

    /// Move a branch of a registered remote
    pub fn set_ref(&self, upstream: &str, name: &str, commit: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(remote) = state.remotes.get_mut(upstream) {
            remote.refs.insert(name.to_string(), commit.to_string());
            if !remote.commits.iter().any(|c| c == commit) {
                remote.commits.push(commit.to_string());
            }
        }
    }

    /// HEAD of a checkout, if it was cloned
    pub fn head(&self, checkout: &Path) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .checkouts
            .get(checkout)
            .map(|(_, head)| head.clone())
    }

    /// Commands issued so far, e.g. `clone <url>` or `checkout <commit>`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl VersionControl for MockVersionControl {
    async fn clone_repo(&self, upstream: &str, target: &Path) -> CwldepResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("clone {}", upstream));
        let head = state
            .remotes
            .get(upstream)
            .map(|r| r.default_head.clone())
            .ok_or_else(|| CwldepError::Vcs(format!("repository not found: {}", upstream)))?;
        std::fs::create_dir_all(target.join(".git"))?;
        state
            .checkouts
            .insert(target.to_path_buf(), (upstream.to_string(), head));
        Ok(())
    }

    async fn fetch_all(&self, checkout: &Path) -> CwldepResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("fetch {}", checkout.display()));
        Ok(())
    }

    async fn rev_parse(&self, checkout: &Path, rev: &str) -> CwldepResult<String> {
        let state = self.state.lock().unwrap();
        let (upstream, head) = state
            .checkouts
            .get(checkout)
            .ok_or_else(|| CwldepError::Vcs(format!("not a repository: {}", checkout.display())))?;
        if rev == "HEAD" {
            return Ok(head.clone());
        }
        let remote = state
            .remotes
            .get(upstream)
            .ok_or_else(|| CwldepError::Vcs(format!("unknown remote {}", upstream)))?;
        if let Some(name) = rev.strip_prefix("origin/") {
            if let Some(commit) = remote.refs.get(name) {
                return Ok(commit.clone());
            }
        }
        if remote.commits.iter().any(|c| c == rev) {
            return Ok(rev.to_string());
        }
        Err(CwldepError::Vcs(format!("unknown revision {}", rev)))
    }

    async fn checkout(&self, checkout: &Path, commit: &str) -> CwldepResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("checkout {}", commit));
        let known = state
            .checkouts
            .get(checkout)
            .and_then(|(upstream, _)| state.remotes.get(upstream))
            .map(|r| r.commits.iter().any(|c| c == commit))
            .unwrap_or(false);
        if !known {
            return Err(CwldepError::Vcs(format!("pathspec '{}' did not match", commit)));
        }
        if let Some(entry) = state.checkouts.get_mut(checkout) {
            entry.1 = commit.to_string();
        }
        Ok(())
    }
}
