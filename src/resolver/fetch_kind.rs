use crate::package::ArchiveFormat;
use reqwest::Url;

/// Path suffix of a workflow descriptor
pub const DESCRIPTOR_SUFFIX: &str = ".cwl";

/// How a dependency is retrieved, decided from its upstream URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// A CWL document; may carry secondary files and nested dependencies
    Descriptor,
    Archive(ArchiveFormat),
    /// Anything else; must turn out to be a git remote
    Repository,
}

impl FetchKind {
    pub fn classify(url: &Url) -> Self {
        let path = url.path();
        if path.ends_with(DESCRIPTOR_SUFFIX) {
            FetchKind::Descriptor
        } else if let Some(format) = ArchiveFormat::from_name(path) {
            FetchKind::Archive(format)
        } else {
            FetchKind::Repository
        }
    }
}
