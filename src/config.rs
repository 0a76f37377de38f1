//! Configuration management for Crosscast
//!
//! Credentials never live here; they are passed to the platform factory as
//! typed inputs. The file only carries platform toggles, endpoints, and the
//! default dispatch order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub twitter: Option<TwitterConfig>,
    pub linkedin: Option<LinkedInConfig>,
    pub bluesky: Option<BlueskyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Dispatch order; entries must parse as platform names.
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub enabled: bool,
    /// Premium accounts get the long-form character limit.
    #[serde(default)]
    pub premium: bool,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    pub enabled: bool,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    pub enabled: bool,
    /// PDS endpoint; defaults to the public entryway.
    pub service: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Write this configuration to a path, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            defaults: DefaultsConfig {
                platforms: vec![
                    "bluesky".to_string(),
                    "twitter".to_string(),
                    "linkedin".to_string(),
                ],
            },
            twitter: Some(TwitterConfig {
                enabled: true,
                premium: false,
                api_base: None,
            }),
            linkedin: Some(LinkedInConfig {
                enabled: true,
                api_base: None,
            }),
            bluesky: Some(BlueskyConfig {
                enabled: true,
                service: None,
            }),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CROSSCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::Invalid("no config directory on this system".to_string()))?;

    Ok(config_dir.join("crosscast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_load_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(format!("{}", err).contains("Config file not found"));
    }

    #[test]
    fn test_load_from_path_parses_platform_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[defaults]
platforms = ["bluesky", "twitter"]

[twitter]
enabled = true
premium = true

[bluesky]
enabled = true
service = "https://pds.example.com"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.defaults.platforms, vec!["bluesky", "twitter"]);

        let twitter = config.twitter.unwrap();
        assert!(twitter.enabled);
        assert!(twitter.premium);

        let bluesky = config.bluesky.unwrap();
        assert_eq!(bluesky.service.as_deref(), Some("https://pds.example.com"));
        assert!(config.linkedin.is_none());
    }

    #[test]
    fn test_premium_defaults_to_false() {
        let config: Config = toml::from_str(
            r#"
[defaults]
platforms = ["twitter"]

[twitter]
enabled = true
"#,
        )
        .unwrap();

        assert!(!config.twitter.unwrap().premium);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::default_config();
        config.save_to_path(&path).unwrap();

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded.defaults.platforms, config.defaults.platforms);
        assert!(reloaded.twitter.is_some());
        assert!(reloaded.bluesky.is_some());
    }

    #[test]
    #[serial]
    fn test_config_env_var_overrides_path() {
        std::env::set_var("CROSSCAST_CONFIG", "/tmp/custom-crosscast.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("CROSSCAST_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/custom-crosscast.toml"));
    }

    #[test]
    #[serial]
    fn test_config_default_path_under_config_dir() {
        std::env::remove_var("CROSSCAST_CONFIG");
        let path = resolve_config_path().unwrap();

        assert!(path.ends_with("crosscast/config.toml"));
    }
}
