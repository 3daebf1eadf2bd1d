//! Recursive resolution of dependency declarations

use super::fetch_kind::FetchKind;
use super::run::ResolutionRun;
use crate::core::path::{ensure_dir, normalize_path, relative_key};
use crate::core::{CwldepError, CwldepResult};
use crate::di::{DocumentLoader, ServiceContainer};
use crate::document::{DependencyDeclaration, DependencyTree};
use crate::package::http::build_http_client;
use crate::package::{ArchiveFormat, FetchStatus, Fetcher, PackageExtractor, Verifier};
use crate::vcs::RepositoryInstaller;
use reqwest::Url;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info};

/// Walks dependency trees and installs every entry under a project root
///
/// Each declaration is classified by its upstream URL and handed to the
/// matching installer. Descriptors are scanned for secondary files and
/// their own `Dependencies` hints, which resolve relative to the
/// descriptor's install directory.
pub struct DependencyResolver {
    loader: Arc<dyn DocumentLoader>,
    verifier: Verifier,
    fetcher: Fetcher,
    repositories: RepositoryInstaller,
    project_root: PathBuf,
}

impl DependencyResolver {
    pub fn new(container: &ServiceContainer, project_root: PathBuf) -> CwldepResult<Self> {
        let client = build_http_client(container.config.as_ref())?;
        Ok(Self {
            loader: Arc::clone(&container.loader),
            verifier: Verifier::new(project_root.clone()),
            fetcher: Fetcher::new(client.clone(), project_root.clone(), container.config.as_ref())?,
            repositories: RepositoryInstaller::new(
                client,
                Arc::clone(&container.vcs),
                project_root.clone(),
            ),
            project_root,
        })
    }

    /// Resolve every declaration of `tree` relative to `basedir`
    ///
    /// A failing entry is recorded in `run` and its siblings still resolve.
    pub fn resolve<'a>(
        &'a self,
        basedir: &'a Path,
        tree: &'a DependencyTree,
        run: &'a mut ResolutionRun,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            for declaration in &tree.dependencies {
                if let Err(e) = self.resolve_entry(basedir, declaration, run).await {
                    run.record_error(&declaration.upstream, e);
                }
            }
        })
    }

    async fn resolve_entry(
        &self,
        basedir: &Path,
        declaration: &DependencyDeclaration,
        run: &mut ResolutionRun,
    ) -> CwldepResult<()> {
        let url = Url::parse(&declaration.upstream).map_err(|e| {
            CwldepError::Document(format!("Invalid upstream {}: {}", declaration.upstream, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(CwldepError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                upstream: declaration.upstream.clone(),
            });
        }

        let install_dir = install_dir(basedir, &url, declaration.install_to.as_deref());
        if !run.operation.is_check() {
            ensure_dir(&install_dir)?;
        }
        let target = install_dir.join(file_name(&url)?);

        match FetchKind::classify(&url) {
            FetchKind::Descriptor => {
                run.enter(&declaration.upstream)?;
                let result = self
                    .install_descriptor(&url, &install_dir, &target, declaration, run)
                    .await;
                run.leave(&declaration.upstream);
                result
            }
            FetchKind::Archive(format) => {
                self.install_archive(&url, &install_dir, &target, format, declaration, run)
                    .await
            }
            FetchKind::Repository => self.repositories.install(&target, declaration, run).await,
        }
    }

    async fn install_descriptor(
        &self,
        url: &Url,
        install_dir: &Path,
        target: &Path,
        declaration: &DependencyDeclaration,
        run: &mut ResolutionRun,
    ) -> CwldepResult<()> {
        let version = declaration.version.clone().unwrap_or_default();
        // the descriptor itself is always compared with upstream
        let verified = self.verifier.verify(target, &run.prior, &mut run.verified);
        self.fetch_file(target, url.as_str(), &version, verified, run).await?;

        if !target.is_file() {
            // check run; nothing installed to scan
            return Ok(());
        }

        let text = tokio::fs::read_to_string(target).await?;
        let document = self.loader.parse(url.as_str(), &text)?;

        let descriptor_dir = Path::new(url.path())
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        for reference in self.loader.scan_references(&document).await? {
            let reference_url = Url::parse(&reference)
                .map_err(|e| CwldepError::Document(format!("Invalid reference {}: {}", reference, e)))?;
            let relative = pathdiff::diff_paths(reference_url.path(), &descriptor_dir)
                .ok_or_else(|| CwldepError::Path(format!("Cannot place {}", reference)))?;
            let dest = normalize_path(&install_dir.join(relative));
            debug!("Secondary file {} -> {}", reference, dest.display());

            if !run.operation.is_check() {
                if let Some(parent) = dest.parent() {
                    ensure_dir(parent)?;
                }
            }
            self.retrieve_file(&dest, &reference, &version, run).await?;
        }

        for tree in self.loader.dependencies(&document)? {
            self.resolve(install_dir, &tree, run).await;
        }
        Ok(())
    }

    async fn install_archive(
        &self,
        url: &Url,
        install_dir: &Path,
        target: &Path,
        format: ArchiveFormat,
        declaration: &DependencyDeclaration,
        run: &mut ResolutionRun,
    ) -> CwldepResult<()> {
        let version = declaration.version.clone().unwrap_or_default();
        let verified = self.verifier.verify(target, &run.prior, &mut run.verified);
        let status = self
            .fetch_file(target, url.as_str(), &version, verified, run)
            .await?;
        if run.operation.is_check() {
            return Ok(());
        }
        let current = status == FetchStatus::UpToDate;

        let extractor = PackageExtractor::new(install_dir.to_path_buf());
        let extraction_dir = extractor.extraction_dir(target)?;
        if current && extraction_dir.is_dir() {
            debug!("{} already extracted", extraction_dir.display());
        } else {
            info!("Extracting {}", target.display());
            extractor.extract_as(target, format)?;
        }

        let key = relative_key(target, &self.project_root);
        let extracted_key = relative_key(&extraction_dir, &self.project_root);
        if let Some(entry) = run.verified.get_mut(&key) {
            entry.installed_to = vec![key, extracted_key];
        }
        Ok(())
    }

    /// Make the secondary file `target` current with `url`
    ///
    /// A file that still matches the lockfile is kept without a download
    /// unless the operation refetches current files.
    async fn retrieve_file(
        &self,
        target: &Path,
        url: &str,
        version: &str,
        run: &mut ResolutionRun,
    ) -> CwldepResult<()> {
        let verified = self.verifier.verify(target, &run.prior, &mut run.verified);
        if verified && !run.operation.refetches_current() {
            return Ok(());
        }
        self.fetch_file(target, url, version, verified, run).await?;
        Ok(())
    }

    /// Fetch `target` and record what the fetch found in `run`
    ///
    /// `verified` tells whether the local copy matched the lockfile before
    /// the fetch.
    async fn fetch_file(
        &self,
        target: &Path,
        url: &str,
        version: &str,
        verified: bool,
        run: &mut ResolutionRun,
    ) -> CwldepResult<FetchStatus> {
        let check_only = run.operation.is_check();
        let outcome = self
            .fetcher
            .fetch(target, url, version, &run.prior, &mut run.verified, check_only)
            .await?;

        let key = relative_key(target, &self.project_root);
        match outcome.status {
            FetchStatus::NeedsInstall => run.record_needs_install(key),
            FetchStatus::Changed => run.record_changed(key),
            // local copy no longer matches the lockfile
            FetchStatus::UpToDate | FetchStatus::New if check_only && !verified => {
                run.record_needs_install(key)
            }
            _ => {}
        }
        Ok(outcome.status)
    }
}

/// `basedir/installTo`, or `basedir/<host>/<directory of the url path>`
fn install_dir(basedir: &Path, url: &Url, install_to: Option<&str>) -> PathBuf {
    if let Some(install_to) = install_to {
        return normalize_path(&basedir.join(install_to));
    }
    let mut host = url.host_str().unwrap_or_default().to_string();
    if let Some(port) = url.port() {
        host = format!("{}:{}", host, port);
    }
    let path = url.path().trim_start_matches('/');
    let dir = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&basedir.join(host).join(dir))
}

fn file_name(url: &Url) -> CwldepResult<&str> {
    url.path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CwldepError::Path(format!("No file name in {}", url)))
}
