//! Configuration management for menuscout.
//!
//! Configuration is read from `~/.config/menuscout/config.toml` at startup
//! (or from an explicit path). If the default file doesn't exist, a default
//! configuration with comments is created. Credentials may also come from
//! the environment, which takes precedence over the file.

use crate::places::PlacesConfig;
use crate::scraper::ScraperConfig;
use crate::structuring::LlmConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const ENV_PLACES_API_KEY: &str = "MENUSCOUT_PLACES_API_KEY";
pub const ENV_LLM_API_KEY: &str = "MENUSCOUT_LLM_API_KEY";
pub const ENV_DB_PATH: &str = "MENUSCOUT_DB_PATH";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub places: PlacesConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Persistence settings. Without a path, write flows are unavailable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            // Create default config with comments
            Self::create_default_config(&config_path)?;
            return Ok(Self::default().with_env());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config.with_env())
    }

    /// Get the default config file path: `~/.config/menuscout/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("menuscout").join("config.toml"))
    }

    /// Apply credential overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(ENV_PLACES_API_KEY) {
            self.places.api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_LLM_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.store.path = Some(PathBuf::from(path));
        }
        self
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# menuscout configuration
#
# Credentials can also be supplied through the environment:
#   MENUSCOUT_PLACES_API_KEY, MENUSCOUT_LLM_API_KEY, MENUSCOUT_DB_PATH

[server]
host = "127.0.0.1"
port = 8080

[scraper]
# Run browser in headless mode (no visible window)
headless = true

# Browser viewport
viewport_width = 1920
viewport_height = 1080

# Page navigation timeout in seconds
timeout_secs = 30

# Plain HTTP fetch timeout in seconds
http_timeout_secs = 10

# Settle delays (milliseconds)
wait_after_load_ms = 1000
map_wait_after_load_ms = 2000
tab_settle_ms = 1500

# Scroll-to-exhaustion on the map menu panel
scroll_step_px = 5000
scroll_interval_ms = 800
max_scroll_attempts = 5

# Budget for both scrapers together, in seconds
global_timeout_secs = 120

# Text limits (characters)
max_text_length = 2500
min_text_length = 100

[places]
endpoint = "https://places.googleapis.com/v1"
# api_key = "..."

[llm]
endpoint = "https://api.openai.com/v1"
model = "gpt-4o-mini"
temperature = 0.2
timeout_secs = 120
# api_key = "..."

[store]
# path = "/var/lib/menuscout/menuscout.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scraper.global_timeout_secs, 120);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.places.api_key.is_none());
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[server]
port = 9000

[places]
api_key = "file-key"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.places.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.scraper.max_text_length, 2500);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.server.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let mut config = Config::default();
        config.places.api_key = Some("file-key".into());

        let config = config.with_overrides(|key| match key {
            ENV_PLACES_API_KEY => Some("env-key".into()),
            ENV_LLM_API_KEY => Some("   ".into()),
            ENV_DB_PATH => Some("/tmp/menus.db".into()),
            _ => None,
        });

        assert_eq!(config.places.api_key.as_deref(), Some("env-key"));
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/menus.db")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scraper]\nheadless = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.scraper.headless);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scraper\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
