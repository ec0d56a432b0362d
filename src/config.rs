//! Configuration file support for poddeck.
//!
//! This module provides functionality for loading and saving user
//! preferences (and the Podcast Index credentials) from a TOML file.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

/// User configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Podcast Index API key.
    #[serde(default)]
    pub api_key: String,

    /// Podcast Index API secret.
    #[serde(default)]
    pub api_secret: String,

    /// Audio player command (overrides the platform default "mpv")
    #[serde(default)]
    pub player: Option<String>,

    /// `since` parameter for the first trending page.
    #[serde(default)]
    pub trending_since: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            player: None,
            trending_since: 0,
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/poddeck/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> std::result::Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("poddeck");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Resolve the API credentials, letting the `PODCAST_INDEX_API_KEY`
    /// and `PODCAST_INDEX_API_SECRET` environment variables override the
    /// config file.
    ///
    /// Missing credentials are a fatal configuration error; no request may
    /// be attempted without them.
    pub fn credentials(&self) -> Result<(String, String)> {
        let key = env::var("PODCAST_INDEX_API_KEY")
            .unwrap_or_else(|_| self.api_key.clone())
            .trim()
            .to_string();
        let secret = env::var("PODCAST_INDEX_API_SECRET")
            .unwrap_or_else(|_| self.api_secret.clone())
            .trim()
            .to_string();

        if key.is_empty() || secret.is_empty() {
            return Err(AppError::Config(
                "Podcast Index API key/secret not configured. Set api_key and \
                 api_secret in the config file, or the PODCAST_INDEX_API_KEY \
                 and PODCAST_INDEX_API_SECRET environment variables."
                    .to_string(),
            ));
        }

        Ok((key, secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_defaults() {
        let config = Config::new();
        assert!(config.api_key.is_empty());
        assert!(config.api_secret.is_empty());
        assert!(config.player.is_none());
        assert_eq!(config.trending_since, 0);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            api_key: "KEY".to_string(),
            api_secret: "SECRET".to_string(),
            player: Some("mpv".to_string()),
            trending_since: 7,
        };

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("api_key = \"KEY\""));
        assert!(toml_str.contains("api_secret = \"SECRET\""));
        assert!(toml_str.contains("player = \"mpv\""));
        assert!(toml_str.contains("trending_since = 7"));
    }

    #[test]
    fn test_config_partial_deserialization() {
        // Only specify some fields, rest should use defaults
        let toml_str = r#"
            api_key = "abc"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key, "abc");
        assert!(config.api_secret.is_empty());
        assert_eq!(config.trending_since, 0);
    }

    #[test]
    fn test_credentials_missing_is_config_error() {
        let config = Config::new();
        // Only meaningful when the env overrides are not set.
        if env::var("PODCAST_INDEX_API_KEY").is_err()
            && env::var("PODCAST_INDEX_API_SECRET").is_err()
        {
            let err = config.credentials().unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
        }
    }

    #[test]
    fn test_credentials_from_file_values() {
        if env::var("PODCAST_INDEX_API_KEY").is_ok()
            || env::var("PODCAST_INDEX_API_SECRET").is_ok()
        {
            return;
        }
        let config = Config {
            api_key: " key ".to_string(),
            api_secret: "secret".to_string(),
            player: None,
            trending_since: 0,
        };
        let (key, secret) = config.credentials().unwrap();
        assert_eq!(key, "key");
        assert_eq!(secret, "secret");
    }
}
