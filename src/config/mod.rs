use crate::core::path::{config_file, ensure_dir};
use crate::core::{CwldepError, CwldepResult};
use crate::di::ConfigProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Checksum algorithm for new lock entries
    /// - "blake3": BLAKE3 (default)
    /// - "sha256": SHA-256
    ///
    /// Existing entries keep the algorithm their checksum prefix names.
    #[serde(default = "default_checksum_algorithm")]
    pub checksum_algorithm: String,

    /// Timeout for a single download or repository probe, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Timeout for a single git command, in seconds
    #[serde(default = "default_vcs_timeout_secs")]
    pub vcs_timeout_secs: u64,

    /// User-Agent header sent with every HTTP request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Show download progress bars on stderr
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

fn default_checksum_algorithm() -> String {
    "blake3".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    300
}

fn default_vcs_timeout_secs() -> u64 {
    600
}

fn default_user_agent() -> String {
    format!("cwldep/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checksum_algorithm: default_checksum_algorithm(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            vcs_timeout_secs: default_vcs_timeout_secs(),
            user_agent: default_user_agent(),
            show_progress: true,
        }
    }
}

impl Config {
    /// Load config from the platform-specific config directory, creating the
    /// default if it doesn't exist
    ///
    /// Config locations:
    /// - `$CWLDEP_CONFIG` if set
    /// - Windows: %APPDATA%\cwldep\config.yaml
    /// - Linux: ~/.config/cwldep/config.yaml
    /// - macOS: ~/Library/Application Support/cwldep/config.yaml
    pub fn load() -> CwldepResult<Self> {
        let config_path = config_file()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    /// Parse and validate config YAML
    pub fn parse(content: &str) -> CwldepResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| CwldepError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the platform-specific config directory
    pub fn save(&self) -> CwldepResult<()> {
        let config_path = config_file()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| CwldepError::Path("Invalid config path".to_string()))?;

        ensure_dir(config_dir)?;

        let content = serde_yaml::to_string(self)
            .map_err(|e| CwldepError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)?;
        Ok(())
    }

    fn validate(&self) -> CwldepResult<()> {
        match self.checksum_algorithm.as_str() {
            "blake3" | "sha256" => {}
            other => {
                return Err(CwldepError::Config(format!(
                    "Invalid checksum algorithm '{}'. Must be 'blake3' or 'sha256'",
                    other
                )))
            }
        }
        if self.fetch_timeout_secs == 0 || self.vcs_timeout_secs == 0 {
            return Err(CwldepError::Config(
                "Timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfigProvider for Config {
    fn checksum_algorithm(&self) -> &str {
        &self.checksum_algorithm
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn vcs_timeout(&self) -> Duration {
        Duration::from_secs(self.vcs_timeout_secs)
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn show_progress(&self) -> bool {
        self.show_progress
    }
}
