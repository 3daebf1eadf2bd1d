use crate::core::path::relative_key;
use crate::core::{CwldepError, CwldepResult};
use crate::di::VersionControl;
use crate::document::DependencyDeclaration;
use crate::lock::LockEntry;
use crate::resolver::{Operation, ResolutionRun};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ref-advertisement endpoint that identifies a smart-HTTP git remote
pub fn probe_url(upstream: &str) -> String {
    format!(
        "{}.git/info/refs?service=git-upload-pack",
        upstream.trim_end_matches('/')
    )
}

/// Full 40-character hexadecimal commit id
pub fn is_commit_id(version: &str) -> bool {
    version.len() == 40 && version.chars().all(|c| c.is_ascii_hexdigit())
}

/// Version a repository should end up at
///
/// The locked commit wins unless the run is an update or nothing is locked
/// yet; then the declared version applies. `None` keeps the current HEAD.
pub fn select_version<'a>(
    declared: Option<&'a str>,
    locked: Option<&'a str>,
    operation: Operation,
) -> Option<&'a str> {
    let locked = locked.filter(|v| !v.is_empty());
    if operation == Operation::Update || locked.is_none() {
        declared.filter(|v| !v.is_empty())
    } else {
        locked
    }
}

/// Installs dependencies that are git repositories
pub struct RepositoryInstaller {
    client: Client,
    vcs: Arc<dyn VersionControl>,
    project_root: PathBuf,
}

impl RepositoryInstaller {
    pub fn new(client: Client, vcs: Arc<dyn VersionControl>, project_root: PathBuf) -> Self {
        Self {
            client,
            vcs,
            project_root,
        }
    }

    /// Confirm `upstream` is served by a git remote
    pub async fn probe(&self, upstream: &str) -> CwldepResult<()> {
        let url = probe_url(upstream);
        debug!("Probing {}", url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            CwldepError::RepositoryProbeFailure {
                upstream: upstream.to_string(),
                reason: e.to_string(),
            }
        })?;
        if response.status() != StatusCode::OK {
            return Err(CwldepError::RepositoryProbeFailure {
                upstream: upstream.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }

    /// Clone or update the checkout at `target` and record its commit
    pub async fn install(
        &self,
        target: &Path,
        declaration: &DependencyDeclaration,
        run: &mut ResolutionRun,
    ) -> CwldepResult<()> {
        self.probe(&declaration.upstream).await?;

        let key = relative_key(target, &self.project_root);
        let has_checkout = target.join(".git").exists();

        if run.operation.is_check() {
            return self.check(target, key, has_checkout, run).await;
        }

        if has_checkout {
            info!("Fetching {}", key);
            self.vcs.fetch_all(target).await?;
        } else {
            info!("Cloning {} to {}", declaration.upstream, key);
            self.vcs.clone_repo(&declaration.upstream, target).await?;
        }

        let locked = run.prior.get(&key).map(|e| e.version.as_str());
        if let Some(version) = select_version(declaration.version.as_deref(), locked, run.operation)
        {
            let commit = if is_commit_id(version) {
                version.to_string()
            } else {
                // only remote-tracking branches resolve this way
                self.vcs
                    .rev_parse(target, &format!("origin/{}", version))
                    .await?
            };
            let head = self.vcs.rev_parse(target, "HEAD").await?;
            if head != commit {
                info!("Checking out {} in {}", commit, key);
                self.vcs.checkout(target, &commit).await?;
            }
        }

        let head = self.vcs.rev_parse(target, "HEAD").await?;
        if let Some(previous) = locked.filter(|v| !v.is_empty() && *v != head) {
            warn!("{} moved from {} to {}", key, previous, head);
        }
        run.verified.insert(
            key.clone(),
            LockEntry::new(declaration.upstream.clone(), head, None, vec![key]),
        );
        Ok(())
    }

    /// Report the state of a checkout without touching it
    async fn check(
        &self,
        target: &Path,
        key: String,
        has_checkout: bool,
        run: &mut ResolutionRun,
    ) -> CwldepResult<()> {
        let Some(entry) = run.prior.get(&key).cloned().filter(|_| has_checkout) else {
            warn!("Need to install {}", key);
            run.record_needs_install(key);
            return Ok(());
        };

        let head = self.vcs.rev_parse(target, "HEAD").await?;
        if head == entry.version {
            info!("Up to date: {}", key);
        } else {
            warn!("{} is at {} but the lockfile has {}", key, head, entry.version);
            run.record_changed(key.clone());
        }
        run.verified.insert(key, entry);
        Ok(())
    }
}
