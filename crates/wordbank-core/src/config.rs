//! Configuration management for Wordbank.
//!
//! Loads configuration from ${WORDBANK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "WORDBANK_BASE_URL";

fn default_config_template() -> &'static str {
    wordbank_assets::DEFAULT_CONFIG_TOML
}

pub mod paths {
    //! Path resolution for Wordbank configuration and data files.
    //!
    //! WORDBANK_HOME resolution order:
    //! 1. WORDBANK_HOME environment variable (if set)
    //! 2. ~/.config/wordbank (default)
    //! 3. ./.wordbank when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the Wordbank home directory.
    pub fn wordbank_home() -> PathBuf {
        if let Ok(home) = std::env::var("WORDBANK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".wordbank"),
            |h| h.join(".config").join("wordbank"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        wordbank_home().join("config.toml")
    }

    /// Returns the path to the device key-value storage file.
    pub fn storage_path() -> PathBuf {
        wordbank_home().join("storage.json")
    }

    /// Returns the directory that holds rolling log files.
    pub fn logs_dir() -> PathBuf {
        wordbank_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API base URL
    pub base_url: String,

    /// Timeout for a single HTTP request in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// Page size for word list fetches
    pub per_page: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "https://api.wordbank.app";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;
    const DEFAULT_PER_PAGE: u32 = 20;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Resolves the base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not a valid absolute URL.
    pub fn effective_base_url(&self) -> Result<String> {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok().as_deref(), &self.base_url)
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Picks the first non-empty of `env_url`, `config_url`, then the default,
/// and validates it.
fn resolve_base_url(env_url: Option<&str>, config_url: &str) -> Result<String> {
    let chosen = [env_url, Some(config_url)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(Config::DEFAULT_BASE_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid API base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url, Config::DEFAULT_BASE_URL);
        assert_eq!(config.per_page, 20);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "per_page = 50\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.per_page, 50);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("base_url"));
        let parsed = Config::load_from(&config_path).unwrap();
        assert_eq!(parsed.base_url, Config::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_base_url_env_wins_over_config() {
        let url = resolve_base_url(Some("http://localhost:9000/"), "http://config").unwrap();
        assert_eq!(url, "http://localhost:9000");
    }

    #[test]
    fn test_base_url_empty_values_fall_back_to_default() {
        let url = resolve_base_url(Some("  "), "").unwrap();
        assert_eq!(url, Config::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        assert!(resolve_base_url(None, "not a url").is_err());
    }
}
