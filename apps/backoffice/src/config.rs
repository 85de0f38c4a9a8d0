//! # Backoffice Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKROOM_*`)
//! 2. Config file (`backoffice.toml`)
//! 3. Defaults (this file)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Default locations                                                      │
//! │     ~/.config/stockroom/backoffice.toml (Linux)                        │
//! │     ~/Library/Application Support/com.stockroom.backoffice/ (macOS)    │
//! │                                                                         │
//! │  Database file lives in the platform data directory unless             │
//! │  STOCKROOM_DB_PATH or [database].path says otherwise                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [database]
//! path = "/var/lib/stockroom/stockroom.db"
//! max_connections = 8
//! lock_wait_ms = 2000
//!
//! [logging]
//! filter = "info,stockroom=debug,sqlx=warn"
//! ```
//!
//! Read-only after startup.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stockroom_db::DbConfig;
use thiserror::Error;
use tracing::{debug, info};

/// Default tracing filter when neither `RUST_LOG` nor `STOCKROOM_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

const CONFIG_FILE: &str = "backoffice.toml";
const DATABASE_FILE: &str = "stockroom.db";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file; `None` means the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Upper bound on waiting for the write lock, in milliseconds.
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_lock_wait_ms() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            lock_wait_ms: default_lock_wait_ms(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

/// Complete backoffice configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackofficeConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl BackofficeConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, or the platform config directory)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading backoffice config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parses TOML text; absent sections and keys take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `STOCKROOM_*` overrides read through `lookup`.
    ///
    /// ## Variables
    /// - `STOCKROOM_DB_PATH`: database file
    /// - `STOCKROOM_MAX_CONNECTIONS`: pool size
    /// - `STOCKROOM_LOCK_WAIT_MS`: bounded lock wait
    /// - `STOCKROOM_LOG`: tracing filter
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("STOCKROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("STOCKROOM_MAX_CONNECTIONS") {
            self.database.max_connections = parse_number("STOCKROOM_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = lookup("STOCKROOM_LOCK_WAIT_MS") {
            self.database.lock_wait_ms = parse_number("STOCKROOM_LOCK_WAIT_MS", &value)?;
        }

        if let Some(filter) = lookup("STOCKROOM_LOG") {
            self.logging.filter = filter;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.database.lock_wait_ms == 0 {
            return Err(ConfigError::Invalid(
                "lock_wait_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Resolved database file path.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        let dirs = project_dirs()
            .ok_or_else(|| ConfigError::Invalid("Could not determine app data directory".into()))?;
        Ok(dirs.data_dir().join(DATABASE_FILE))
    }

    /// Builds the database configuration.
    pub fn to_db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .lock_wait_timeout(Duration::from_millis(self.database.lock_wait_ms)))
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "stockroom", "backoffice")
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BackofficeConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.lock_wait_ms, 5_000);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = BackofficeConfig::from_toml(
            r#"
            [database]
            path = "/tmp/shop.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/shop.db")));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = BackofficeConfig::from_toml(
            r#"
            [database]
            path = "/tmp/shop.db"
            max_connections = 3
            "#,
        )
        .unwrap();

        config
            .apply_overrides(env(&[
                ("STOCKROOM_DB_PATH", "/srv/stock.db"),
                ("STOCKROOM_LOCK_WAIT_MS", "250"),
                ("STOCKROOM_LOG", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/srv/stock.db")));
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.database.lock_wait_ms, 250);
        assert_eq!(config.logging.filter, "debug");

        let db = config.to_db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/srv/stock.db"));
        assert_eq!(db.lock_wait_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_bad_env_number_rejected() {
        let mut config = BackofficeConfig::default();
        let result = config.apply_overrides(env(&[("STOCKROOM_MAX_CONNECTIONS", "many")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_zero_pool_invalid() {
        let mut config = BackofficeConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
