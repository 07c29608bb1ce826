use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

const CONFIG_FILE: &str = ".pr-reviewer.toml";
const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_SUMMARY: &str = "AI Code Review";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-reviewer.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN, then TOKEN_GITHUB.
    pub token: Option<String>,
    /// REST base URL, for GitHub Enterprise
    pub api_base: Option<String>,
}

impl GitHubConfig {
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewConfig {
    /// Body of the posted review
    pub summary: Option<String>,
}

impl ReviewConfig {
    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or(DEFAULT_SUMMARY)
    }
}

impl Config {
    /// Load configuration from .pr-reviewer.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// then GITHUB_TOKEN, then TOKEN_GITHUB.
    pub fn github_token(&self) -> Option<String> {
        resolve_token(
            self.github.token.clone(),
            std::env::var("GITHUB_TOKEN").ok(),
            std::env::var("TOKEN_GITHUB").ok(),
        )
    }
}

/// First non-blank token, in precedence order.
fn resolve_token(
    configured: Option<String>,
    github_token: Option<String>,
    token_github: Option<String>,
) -> Option<String> {
    [configured, github_token, token_github]
        .into_iter()
        .flatten()
        .find(|token| !token.trim().is_empty())
}
