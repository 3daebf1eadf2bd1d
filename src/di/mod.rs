//! Dependency injection infrastructure for cwldep
//!
//! Services are reached through traits so resolution can run against
//! mocked configuration and version control in tests.
//!
//! # Example (Testing)
//! ```
//! use cwldep::di::{mocks::*, ConfigProvider, ServiceContainer};
//! use cwldep::document::YamlDocumentLoader;
//! use std::sync::Arc;
//!
//! # fn example() -> cwldep::core::CwldepResult<()> {
//! let config = Arc::new(MockConfigProvider::default());
//! let loader = Arc::new(YamlDocumentLoader::new(config.as_ref())?);
//! let vcs = Arc::new(MockVersionControl::new());
//!
//! let container = ServiceContainer::with_providers(config, loader, vcs);
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod mocks;
pub mod traits;

// Re-export key types
pub use container::ServiceContainer;
pub use traits::{ConfigProvider, DocumentLoader, VersionControl};
