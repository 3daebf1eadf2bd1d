use crate::core::{CwldepError, CwldepResult};
use crate::di::ConfigProvider;
use reqwest::{header, Client};

/// Shared HTTP client for documents, artifacts, and repository probes
pub fn build_http_client(config: &dyn ConfigProvider) -> CwldepResult<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(config.user_agent())
            .map_err(|e| CwldepError::Config(format!("Invalid user agent: {}", e)))?,
    );

    Client::builder()
        .default_headers(headers)
        .timeout(config.fetch_timeout())
        .build()
        .map_err(|e| CwldepError::Config(format!("Failed to create HTTP client: {}", e)))
}
