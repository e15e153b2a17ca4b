//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! `coastal-config.toml` file. It replaces hard-coded station ids and API key
//! placeholders with an explicit structure that is passed into the tide fetch
//! at call time. The API token itself never lives in the file: the file only
//! names the environment variable it is read from.

use crate::tide_data::Units;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "coastal-config.toml";

/// NOAA CO-OPS data API endpoint.
pub const NOAA_DATAGETTER_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Errors raised by the strict loader [`Config::from_path`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Application configuration loaded from coastal-config.toml
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// NOAA station configuration
    pub station: StationConfig,
    /// Default tide query parameters
    pub tides: TidesConfig,
    /// Remote service settings
    pub api: ApiConfig,
    /// Chart output dimensions
    pub chart: ChartConfig,
}

/// NOAA tide station configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    /// NOAA station ID (e.g., "9410230" for La Jolla / San Francisco area)
    pub id: String,
    /// Human-readable station name for reference
    pub name: String,
}

/// Tide query defaults; every field can be overridden on the command line.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TidesConfig {
    pub begin_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Vertical reference level, e.g. "MLLW" or "MSL"
    pub datum: String,
    pub units: Units,
}

/// Remote service settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as the `application` parameter so NOAA can attribute traffic
    pub application: String,
    /// Name of the environment variable holding the API token
    pub token_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}
/// Bitmap chart dimensions in pixels, clamped to 120x100 up to 4096x4096
/// Bitmap chart dimensions in pixels
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            id: "9410230".to_string(),
            name: "San Francisco, CA".to_string(),
        }
    }
}

impl Default for TidesConfig {
    fn default() -> Self {
        TidesConfig {
            begin_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2023, 5, 2).unwrap_or_default(),
            datum: "MLLW".to_string(),
            units: Units::English,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: NOAA_DATAGETTER_URL.to_string(),
            application: "coastal_toolkit".to_string(),
            token_env: "NOAA_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            width: 640,
            height: 300,
        }
    }
}

impl ApiConfig {
    /// Read the API token from the configured environment variable.
    /// Blank values count as absent.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl Config {
    /// Load configuration from coastal-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(config) => {
                tracing::info!(
                    path = %path.display(),
                    station = %config.station.name,
                    "loaded configuration"
                );
                config
            }
            Err(ConfigError::Io(_)) => {
                tracing::info!(
                    path = %path.display(),
                    "no config file found, using defaults"
                );
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from `path`, reporting any failure.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Write the configuration as pretty TOML.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        tracing::info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.station.id, "9410230");
        assert_eq!(config.tides.datum, "MLLW");
        assert_eq!(config.tides.units, Units::English);
        assert_eq!(
            config.tides.begin_date,
            NaiveDate::from_ymd_opt(2023, 5, 1).unwrap()
        );
        assert_eq!(config.api.base_url, NOAA_DATAGETTER_URL);
        assert_eq!(config.api.token_env, "NOAA_API_KEY");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[station]
id = "8418150"
name = "Portland, ME"

[tides]
units = "metric"
"#,
        )
        .unwrap();
        assert_eq!(parsed.station.id, "8418150");
        assert_eq!(parsed.tides.units, Units::Metric);
        assert_eq!(parsed.tides.datum, "MLLW");
        assert_eq!(parsed.api.timeout_secs, 30);
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.station.id = "8443970".to_string();
        config.save_to_path(file.path()).unwrap();

        let loaded = Config::from_path(file.path()).unwrap();
        assert_eq!(loaded.station.id, "8443970");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        assert_eq!(config.station.id, "9410230");
        assert!(matches!(
            Config::from_path("/nonexistent/path"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[station\nid = ").unwrap();

        assert!(matches!(
            Config::from_path(file.path()),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(Config::load_from_path(file.path()), Config::default());
    }

    #[test]
    fn test_missing_token_env() {
        let api = ApiConfig {
            token_env: "COASTAL_TOOLKIT_TEST_UNSET_TOKEN".to_string(),
            ..ApiConfig::default()
        };
        assert_eq!(api.token(), None);
    }
}
