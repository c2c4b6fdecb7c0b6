//! Configuration management for fastfoodz.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::yelp::params::MAX_RADIUS_METERS;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "fastfoodz";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "snapshots.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "FASTFOODZ_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FASTFOODZ_`, sections split on `__`)
/// 2. TOML config file at `~/.config/fastfoodz/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API configuration.
    pub api: ApiConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Default search configuration.
    pub search: SearchConfig,
}

/// Remote API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API.
    pub base_url: String,
    /// Bearer token. Required for refreshes.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with each request.
    pub user_agent: String,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/fastfoodz/snapshots.db`
    pub database_path: Option<PathBuf>,
    /// Pruning starts once more than this many snapshots are stored.
    pub prune_threshold: usize,
    /// Number of most recent snapshots kept by a prune.
    pub keep_snapshots: usize,
}

/// Defaults for refreshes started without explicit arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Latitude to search around.
    pub latitude: f64,
    /// Longitude to search around.
    pub longitude: f64,
    /// Search radius in metres.
    pub radius_meters: u32,
    /// Category aliases to search for.
    pub categories: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.yelp.com".to_string(),
            api_key: None,
            timeout_secs: 30,
            user_agent: format!("fastfoodz/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            prune_threshold: 10,
            keep_snapshots: 5,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        // Times Square
        Self {
            latitude: 40.758_896,
            longitude: -73.985_130,
            radius_meters: 1000,
            categories: default_categories(),
        }
    }
}

/// Default category aliases.
fn default_categories() -> Vec<String> {
    ["pizza", "mexican", "chinese", "burgers"]
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(Error::config_validation(
                "api.timeout_secs must be greater than 0",
            ));
        }

        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(Error::config_validation(format!(
                "api.base_url is not a valid URL: {}",
                self.api.base_url
            )));
        }

        if self.storage.keep_snapshots == 0 {
            return Err(Error::config_validation(
                "storage.keep_snapshots must be at least 1",
            ));
        }

        if self.storage.keep_snapshots > self.storage.prune_threshold {
            return Err(Error::config_validation(format!(
                "storage.keep_snapshots ({}) cannot be greater than storage.prune_threshold ({})",
                self.storage.keep_snapshots, self.storage.prune_threshold
            )));
        }

        if !crate::model::Coordinate::new(self.search.latitude, self.search.longitude).is_valid()
        {
            return Err(Error::config_validation(format!(
                "search coordinates ({}, {}) are out of range",
                self.search.latitude, self.search.longitude
            )));
        }

        if self.search.radius_meters == 0 || self.search.radius_meters > MAX_RADIUS_METERS {
            return Err(Error::config_validation(format!(
                "search.radius_meters must be between 1 and {MAX_RADIUS_METERS}"
            )));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}
