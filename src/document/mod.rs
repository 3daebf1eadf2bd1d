//! Workflow documents
//!
//! A CWL document declares its external dependencies in a hint:
//!
//! ```yaml
//! $namespaces:
//!   dep: http://commonwl.org/cwldep#
//! hints:
//!   dep:Dependencies:
//!     dependencies:
//!       - upstream: https://example.com/tools/align.cwl
//!       - upstream: https://github.com/org/scripts
//!         version: v1.2
//!         installTo: scripts
//! ```

pub mod editor;
pub mod loader;
pub mod scan;

pub use editor::add_dependency;
pub use loader::YamlDocumentLoader;

use serde::{Deserialize, Serialize};

/// Namespace of the cwldep vocabulary
pub const CWLDEP_NAMESPACE: &str = "http://commonwl.org/cwldep#";

/// Fully expanded class of a dependencies hint
pub const DEPENDENCIES_CLASS: &str = "http://commonwl.org/cwldep#Dependencies";

/// One external dependency of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub upstream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        rename = "installTo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub install_to: Option<String>,
}

impl DependencyDeclaration {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            version: None,
            install_to: None,
        }
    }
}

/// The declarations of one `Dependencies` hint, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTree {
    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,
}

impl DependencyTree {
    pub fn new(dependencies: Vec<DependencyDeclaration>) -> Self {
        Self { dependencies }
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// A parsed workflow document
#[derive(Debug, Clone)]
pub struct Document {
    /// Base URI for resolving relative references
    pub uri: String,
    pub content: serde_yaml::Value,
}

/// Expand a `prefix:name` symbol through a `$namespaces` mapping.
/// Unknown prefixes and plain names are returned unchanged.
pub fn expand_namespace(namespaces: &serde_yaml::Mapping, symbol: &str) -> String {
    if let Some((prefix, rest)) = symbol.split_once(':') {
        if let Some(base) = namespaces.get(prefix).and_then(|v| v.as_str()) {
            return format!("{}{}", base, rest);
        }
    }
    symbol.to_string()
}

/// The `$namespaces` mapping of a document root (empty when absent)
pub fn namespaces_of(content: &serde_yaml::Value) -> serde_yaml::Mapping {
    content
        .get("$namespaces")
        .and_then(|v| v.as_mapping())
        .cloned()
        .unwrap_or_default()
}
