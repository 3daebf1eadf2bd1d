//! Trait definitions for dependency injection

use crate::core::CwldepResult;
use crate::document::{DependencyTree, Document};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Trait for configuration access
///
/// Provides read-only access to application configuration.
/// Implementations should be thread-safe (Send + Sync).
pub trait ConfigProvider: Send + Sync {
    /// Get the checksum algorithm for new entries (e.g., "blake3", "sha256")
    fn checksum_algorithm(&self) -> &str;

    /// Timeout applied to each HTTP request
    fn fetch_timeout(&self) -> Duration;

    /// Timeout applied to each version-control command
    fn vcs_timeout(&self) -> Duration;

    /// User-Agent header for HTTP requests
    fn user_agent(&self) -> &str;

    /// Whether to draw download progress bars
    fn show_progress(&self) -> bool;
}

/// Trait for workflow document access
///
/// The resolver only needs two capabilities from a document: the
/// dependency trees declared in its hints, and the files it references.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load a document from a local path or an http(s) URL
    async fn load(&self, location: &str) -> CwldepResult<Document>;

    /// Parse document text; `uri` is the base for relative references
    fn parse(&self, uri: &str, text: &str) -> CwldepResult<Document>;

    /// Every `Dependencies` hint in the document, in document order
    fn dependencies(&self, document: &Document) -> CwldepResult<Vec<DependencyTree>>;

    /// Absolute URLs of every file the document references, following
    /// `$import` and `run` into sub-documents
    async fn scan_references(&self, document: &Document) -> CwldepResult<Vec<String>>;
}

/// Trait for version-control operations on a local checkout
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `upstream` into `target`
    async fn clone_repo(&self, upstream: &str, target: &Path) -> CwldepResult<()>;

    /// Fetch all remotes of the checkout at `checkout`
    async fn fetch_all(&self, checkout: &Path) -> CwldepResult<()>;

    /// Resolve a revision to a full commit id
    async fn rev_parse(&self, checkout: &Path, rev: &str) -> CwldepResult<String>;

    /// Check out a commit (detached)
    async fn checkout(&self, checkout: &Path, commit: &str) -> CwldepResult<()>;
}
