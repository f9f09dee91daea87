// crates/core/src/config.rs
//! Process configuration: database location, timeline windows, logging.
//!
//! Loaded from TOML; every field has a default so an empty file (or no file
//! at all) is a valid configuration.

use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dedup::DedupPolicy;
use crate::error::ConfigError;
use crate::sessions::SessionConfig;

/// Env var naming a TOML config file.
pub const CONFIG_ENV: &str = "STATLINE_CONFIG";
/// Env var overriding `database.path`.
pub const DB_PATH_ENV: &str = "STATLINE_DB_PATH";
/// Env var overriding `logging.filter`.
pub const LOG_ENV: &str = "STATLINE_LOG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub timeline: TimelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `None` means the platform default from [`crate::paths::db_path`].
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 4,
            busy_timeout_secs: 30,
        }
    }
}

/// Windows used by ingestion dedup and session reconstruction, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub min_spacing_secs: u64,
    pub dedup_window_secs: u64,
    pub session_idle_secs: u64,
    pub session_lookback_secs: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_spacing_secs: 60,
            dedup_window_secs: 60 * 60,
            session_idle_secs: 60 * 60,
            session_lookback_secs: 2 * 60 * 60,
        }
    }
}

impl TimelineConfig {
    pub fn dedup_policy(&self) -> DedupPolicy {
        DedupPolicy {
            min_spacing: secs(self.min_spacing_secs),
            dedup_window: secs(self.dedup_window_secs),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            idle_threshold: secs(self.session_idle_secs),
            lookback: secs(self.session_lookback_secs),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("timeline.min_spacing_secs", self.min_spacing_secs),
            ("timeline.dedup_window_secs", self.dedup_window_secs),
            ("timeline.session_idle_secs", self.session_idle_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.session_lookback_secs < self.session_idle_secs {
            return Err(ConfigError::Invalid(format!(
                "timeline.session_lookback_secs ({}) must be at least timeline.session_idle_secs ({})",
                self.session_lookback_secs, self.session_idle_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info,statline_db=debug"`. `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
    /// When set, logs also go to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
            directory: None,
        }
    }
}

impl Config {
    /// Parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Defaults, or the file named by `STATLINE_CONFIG`, then env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(path) = std::env::var_os(DB_PATH_ENV).filter(|p| !p.is_empty()) {
            debug!(var = DB_PATH_ENV, "Database path overridden from environment");
            config.database.path = Some(PathBuf::from(path));
        }
        if let Ok(filter) = std::env::var(LOG_ENV) {
            if !filter.trim().is_empty() {
                config.logging.filter = filter;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be positive".into(),
            ));
        }
        self.timeline.validate()
    }
}

fn secs(value: u64) -> Duration {
    let value = i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 1000);
    Duration::seconds(value)
}
