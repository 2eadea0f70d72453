use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".git-pr.toml";
pub const API_URL_ENV: &str = "GIT_PR_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .git-pr.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Hosting API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Local git invocation settings
    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,
    /// Host name expected in the origin URL.
    pub host: String,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Page size for the open PR listing (GitHub caps it at 100).
    pub per_page: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            host: "github.com".to_string(),
            user_agent: concat!("git-pr/", env!("CARGO_PKG_VERSION")).to_string(),
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Program used for every version-control command.
    pub program: String,
    /// Remote whose URL identifies the GitHub repository.
    pub origin: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            origin: "origin".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from .git-pr.toml in the current directory.
    /// Returns default config if the file doesn't exist, then applies
    /// the GIT_PR_API_URL override.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if let Ok(api_url) = std::env::var(API_URL_ENV) {
            if !api_url.trim().is_empty() {
                config.github.api_url = api_url;
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// API base URL with any trailing slash removed.
    pub fn api_base(&self) -> &str {
        self.github.api_url.trim_end_matches('/')
    }
}
