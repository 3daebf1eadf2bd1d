//! Service container for dependency injection

use super::traits::{ConfigProvider, DocumentLoader, VersionControl};
use crate::config::Config;
use crate::core::CwldepResult;
use crate::document::YamlDocumentLoader;
use crate::vcs::GitCli;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Holds the services a resolution pass needs as trait objects, so tests
/// can swap in mocks for configuration, document loading, and git.
///
/// # Example (Production)
///
/// ```no_run
/// use cwldep::di::ServiceContainer;
///
/// # fn example() -> cwldep::core::CwldepResult<()> {
/// let container = ServiceContainer::new()?;
/// println!("Checksums: {}", container.config.checksum_algorithm());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ServiceContainer {
    pub config: Arc<dyn ConfigProvider>,
    pub loader: Arc<dyn DocumentLoader>,
    pub vcs: Arc<dyn VersionControl>,
}

impl ServiceContainer {
    /// Create a new service container with production implementations
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or created, or
    /// the HTTP client cannot be built.
    pub fn new() -> CwldepResult<Self> {
        let config = Config::load()?;
        Self::from_config(Arc::new(config))
    }

    /// Production loader and git around an explicit configuration
    pub fn from_config(config: Arc<dyn ConfigProvider>) -> CwldepResult<Self> {
        let loader = YamlDocumentLoader::new(config.as_ref())?;
        let vcs = GitCli::new(config.vcs_timeout());
        Ok(Self {
            config,
            loader: Arc::new(loader),
            vcs: Arc::new(vcs),
        })
    }

    /// Create a container with custom providers (for testing)
    pub fn with_providers(
        config: Arc<dyn ConfigProvider>,
        loader: Arc<dyn DocumentLoader>,
        vcs: Arc<dyn VersionControl>,
    ) -> Self {
        Self {
            config,
            loader,
            vcs,
        }
    }
}
