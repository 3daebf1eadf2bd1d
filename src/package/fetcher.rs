use super::checksum::{checksums_match, ChecksumAlgorithm};
use crate::core::path::relative_key;
use crate::core::{CwldepError, CwldepResult};
use crate::di::ConfigProvider;
use crate::lock::{LockEntry, Lockfile, VerifiedSet};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// What a fetch found out about an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Check-only run and the artifact was never installed; nothing was downloaded
    NeedsInstall,
    /// No prior checksum to compare against
    New,
    /// Upstream content matches the prior checksum
    UpToDate,
    /// Upstream content differs from the prior checksum
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub status: FetchStatus,
    /// Hash of the upstream content, when it was downloaded
    pub checksum: Option<String>,
}

/// Streams a single remote artifact to disk while hashing it
pub struct Fetcher {
    client: Client,
    project_root: PathBuf,
    algorithm: ChecksumAlgorithm,
    show_progress: bool,
}

impl Fetcher {
    pub fn new(client: Client, project_root: PathBuf, config: &dyn ConfigProvider) -> CwldepResult<Self> {
        Ok(Self {
            client,
            project_root,
            algorithm: ChecksumAlgorithm::parse(config.checksum_algorithm())?,
            show_progress: config.show_progress(),
        })
    }

    /// Download `url` to `target` and reconcile it with the prior lock entry
    ///
    /// With `check_only` the content is hashed but never written, and an
    /// artifact that was never installed is reported without any request.
    /// Otherwise the download lands in `<target>_download_` and is renamed
    /// over `target`, and a fresh entry is recorded in `verified`.
    pub async fn fetch(
        &self,
        target: &Path,
        url: &str,
        version: &str,
        prior: &Lockfile,
        verified: &mut VerifiedSet,
        check_only: bool,
    ) -> CwldepResult<FetchOutcome> {
        let key = relative_key(target, &self.project_root);
        let prior_checksum = prior.get(&key).and_then(|e| e.checksum.clone());

        if check_only && (!target.exists() || !prior.contains(&key)) {
            warn!("Need to install {}", key);
            return Ok(FetchOutcome {
                status: FetchStatus::NeedsInstall,
                checksum: None,
            });
        }

        let algorithm = prior_checksum
            .as_deref()
            .map(ChecksumAlgorithm::from_checksum)
            .unwrap_or(self.algorithm);

        let temp = if check_only {
            None
        } else {
            Some(download_path(target)?)
        };

        info!("Fetching {} to {}", url, key);
        let checksum = match self.download(url, temp.as_deref(), algorithm).await {
            Ok(checksum) => checksum,
            Err(e) => {
                if let Some(temp) = &temp {
                    let _ = fs::remove_file(temp).await;
                }
                return Err(e);
            }
        };

        let status = match prior_checksum.as_deref() {
            Some(old) if checksums_match(old, &checksum) => {
                info!("Up to date: {}", key);
                FetchStatus::UpToDate
            }
            Some(_) => {
                warn!("Upstream has changed: {}", key);
                FetchStatus::Changed
            }
            None => FetchStatus::New,
        };

        if let Some(temp) = temp {
            if let Err(e) = fs::rename(&temp, target).await {
                let _ = fs::remove_file(&temp).await;
                return Err(e.into());
            }
            let mut entry =
                LockEntry::new(url, version, Some(checksum.clone()), vec![key.clone()]);
            // unchanged content keeps its original retrieval time
            if let (FetchStatus::UpToDate, Some(previous)) = (status, prior.get(&key)) {
                entry.retrieved_at = previous.retrieved_at;
            }
            verified.insert(key, entry);
        }

        Ok(FetchOutcome {
            status,
            checksum: Some(checksum),
        })
    }

    /// Stream the response body through the hasher, writing it to `dest`
    /// when given
    async fn download(
        &self,
        url: &str,
        dest: Option<&Path>,
        algorithm: ChecksumAlgorithm,
    ) -> CwldepResult<String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CwldepError::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(CwldepError::fetch(url, format!("HTTP {}", response.status())));
        }

        let progress = self.progress_bar(response.content_length());
        let mut file = match dest {
            Some(path) => Some(fs::File::create(path).await?),
            None => None,
        };
        let mut hasher = algorithm.hasher();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CwldepError::fetch(url, e))?
        {
            hasher.update(&chunk);
            if let Some(file) = file.as_mut() {
                file.write_all(&chunk).await?;
            }
            progress.inc(chunk.len() as u64);
        }

        if let Some(mut file) = file {
            file.flush().await?;
        }
        progress.finish_and_clear();

        let checksum = hasher.finish();
        debug!("{} hashed to {}", url, checksum);
        Ok(checksum)
    }

    fn progress_bar(&self, length: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(length.unwrap_or(0));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Sibling temp file a download streams into before the rename
pub fn download_path(target: &Path) -> CwldepResult<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CwldepError::Path(format!("Invalid target path: {}", target.display())))?;
    Ok(target.with_file_name(format!("{}_download_", file_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::mocks::MockConfigProvider;
    use crate::package::checksum::file_checksum;
    use crate::package::http::build_http_client;
    use std::fs as stdfs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(root: &Path) -> Fetcher {
        let config = MockConfigProvider::default();
        Fetcher::new(build_http_client(&config).unwrap(), root.to_path_buf(), &config).unwrap()
    }

    async fn serve(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_download_path() {
        assert_eq!(
            download_path(Path::new("/x/tool.cwl")).unwrap(),
            PathBuf::from("/x/tool.cwl_download_")
        );
    }

    #[tokio::test]
    async fn test_fetch_new_artifact() {
        let server = MockServer::start().await;
        serve(&server, "/tools/a.cwl", "class: CommandLineTool\n").await;
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a.cwl");
        let url = format!("{}/tools/a.cwl", server.uri());

        let mut verified = Lockfile::new();
        let outcome = fetcher(temp.path())
            .fetch(&target, &url, "", &Lockfile::new(), &mut verified, false)
            .await
            .unwrap();

        assert_eq!(outcome.status, FetchStatus::New);
        let expected = format!("blake3:{}", blake3::hash(b"class: CommandLineTool\n").to_hex());
        assert_eq!(outcome.checksum.as_deref(), Some(expected.as_str()));
        assert_eq!(stdfs::read_to_string(&target).unwrap(), "class: CommandLineTool\n");
        assert!(!temp.path().join("a.cwl_download_").exists());

        let entry = verified.get("a.cwl").unwrap();
        assert_eq!(entry.checksum.as_deref(), Some(expected.as_str()));
        assert_eq!(entry.installed_to, vec!["a.cwl".to_string()]);
        assert_eq!(entry.upstream, url);
    }

    #[tokio::test]
    async fn test_fetch_twice_is_stable() {
        let server = MockServer::start().await;
        serve(&server, "/a.cwl", "same").await;
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a.cwl");
        let url = format!("{}/a.cwl", server.uri());
        let fetcher = fetcher(temp.path());

        let mut first = Lockfile::new();
        fetcher.fetch(&target, &url, "", &Lockfile::new(), &mut first, false).await.unwrap();
        let mut second = Lockfile::new();
        let outcome = fetcher.fetch(&target, &url, "", &first, &mut second, false).await.unwrap();

        assert_eq!(outcome.status, FetchStatus::UpToDate);
        assert_eq!(first.get("a.cwl"), second.get("a.cwl"));
    }

    #[tokio::test]
    async fn test_fetch_detects_upstream_change() {
        let server = MockServer::start().await;
        serve(&server, "/a.cwl", "v1").await;
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a.cwl");
        let url = format!("{}/a.cwl", server.uri());
        let fetcher = fetcher(temp.path());

        let mut prior = Lockfile::new();
        fetcher.fetch(&target, &url, "", &Lockfile::new(), &mut prior, false).await.unwrap();

        server.reset().await;
        serve(&server, "/a.cwl", "v2").await;

        let mut verified = Lockfile::new();
        let outcome = fetcher.fetch(&target, &url, "", &prior, &mut verified, false).await.unwrap();
        assert_eq!(outcome.status, FetchStatus::Changed);
        let h2 = format!("blake3:{}", blake3::hash(b"v2").to_hex());
        assert_eq!(verified.get("a.cwl").unwrap().checksum.as_deref(), Some(h2.as_str()));
        assert_eq!(stdfs::read_to_string(&target).unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_check_only_never_installed_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x"))
            .expect(0)
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a.cwl");

        let mut verified = Lockfile::new();
        let outcome = fetcher(temp.path())
            .fetch(&target, &format!("{}/a.cwl", server.uri()), "", &Lockfile::new(), &mut verified, true)
            .await
            .unwrap();

        assert_eq!(outcome.status, FetchStatus::NeedsInstall);
        assert!(verified.is_empty());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_check_only_reports_change_without_writing() {
        let server = MockServer::start().await;
        serve(&server, "/a.cwl", "v1").await;
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a.cwl");
        let url = format!("{}/a.cwl", server.uri());
        let fetcher = fetcher(temp.path());

        let mut prior = Lockfile::new();
        fetcher.fetch(&target, &url, "", &Lockfile::new(), &mut prior, false).await.unwrap();

        server.reset().await;
        serve(&server, "/a.cwl", "v2").await;

        let mut verified = Lockfile::new();
        let outcome = fetcher.fetch(&target, &url, "", &prior, &mut verified, true).await.unwrap();
        assert_eq!(outcome.status, FetchStatus::Changed);
        assert_eq!(stdfs::read_to_string(&target).unwrap(), "v1");
        assert!(!temp.path().join("a.cwl_download_").exists());
        assert!(verified.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_keeps_prior_algorithm() {
        let server = MockServer::start().await;
        serve(&server, "/a.cwl", "body").await;
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a.cwl");
        stdfs::write(&target, "body").unwrap();
        let url = format!("{}/a.cwl", server.uri());

        let mut prior = Lockfile::new();
        prior.insert(
            "a.cwl".to_string(),
            LockEntry::new(
                url.clone(),
                "",
                Some(file_checksum(&target, ChecksumAlgorithm::Sha256).unwrap()),
                vec!["a.cwl".to_string()],
            ),
        );

        let mut verified = Lockfile::new();
        let outcome = fetcher(temp.path())
            .fetch(&target, &url, "", &prior, &mut verified, false)
            .await
            .unwrap();
        assert_eq!(outcome.status, FetchStatus::UpToDate);
        assert!(outcome.checksum.unwrap().starts_with("sha256:"));
    }

    #[tokio::test]
    async fn test_fetch_http_error_cleans_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a.cwl");

        let mut verified = Lockfile::new();
        let result = fetcher(temp.path())
            .fetch(&target, &format!("{}/a.cwl", server.uri()), "", &Lockfile::new(), &mut verified, false)
            .await;

        assert!(matches!(result, Err(CwldepError::FetchFailure { .. })));
        assert!(!target.exists());
        assert!(!temp.path().join("a.cwl_download_").exists());
        assert!(verified.is_empty());
    }
}
