use thiserror::Error;

pub type CwldepResult<T> = Result<T, CwldepError>;

#[derive(Error, Debug)]
pub enum CwldepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document error: {0}")]
    Document(String),

    /// Upstream uses a scheme other than http or https.
    #[error("Scheme {scheme} not supported: {upstream}")]
    UnsupportedScheme { scheme: String, upstream: String },

    #[error("Failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    /// Upstream is neither a descriptor nor an archive, and no repository
    /// answers at its ref-advertisement endpoint.
    #[error("No matching fetch kind for {upstream}: {reason}")]
    RepositoryProbeFailure { upstream: String, reason: String },

    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Circular dependency detected: {0}")]
    DependencyCycle(String),
}

impl CwldepError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        CwldepError::FetchFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
