use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::search::SearchOptions;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// geocoding_url = "https://geocoding-api.open-meteo.com/v1"
/// forecast_url = "https://api.open-meteo.com/v1"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// HTTP timeout for both APIs.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

fn default_forecast_url() -> String {
    DEFAULT_FORECAST_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_debounce_ms() -> u64 {
    300
}

const fn default_suggestion_limit() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            timeout_secs: default_timeout_secs(),
            debounce_ms: default_debounce_ms(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        for (field, url) in [
            ("geocoding_url", &self.geocoding_url),
            ("forecast_url", &self.forecast_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("{field} must be an http(s) URL, got '{url}'"));
            }
        }

        if self.suggestion_limit == 0 {
            return Err(anyhow!("suggestion_limit must be at least 1"));
        }

        Ok(())
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            suggestion_limit: self.suggestion_limit,
            ..SearchOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.geocoding_url, DEFAULT_GEOCODING_URL);
        assert_eq!(cfg.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(cfg.timeout_secs, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = Config::from_toml("timeout_secs = 3\n").expect("partial config must load");
        assert_eq!(cfg.timeout_secs, 3);
        assert_eq!(cfg.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(cfg.suggestion_limit, 5);
    }

    #[test]
    fn rejects_non_http_url() {
        let err = Config::from_toml("forecast_url = \"ftp://example.com\"\n").unwrap_err();
        assert!(err.to_string().contains("forecast_url"));
    }

    #[test]
    fn rejects_zero_suggestion_limit() {
        assert!(Config::from_toml("suggestion_limit = 0\n").is_err());
    }

    #[test]
    fn toml_roundtrip_preserves_fields() {
        let cfg = Config {
            geocoding_url: "http://localhost:8080".into(),
            debounce_ms: 150,
            ..Config::default()
        };
        let text = toml::to_string_pretty(&cfg).expect("serializes");
        assert_eq!(Config::from_toml(&text).expect("parses"), cfg);
    }

    #[test]
    fn search_options_follow_config() {
        let cfg = Config {
            debounce_ms: 120,
            suggestion_limit: 3,
            ..Config::default()
        };
        let opts = cfg.search_options();
        assert_eq!(opts.debounce, Duration::from_millis(120));
        assert_eq!(opts.suggestion_limit, 3);
        assert_eq!(opts.min_query_chars, 2);
    }
}
