//! Configuration loaded from a TOML file.

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub reset: ResetConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("roster_tasks.db"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON catalog replacing the built-in one (None = built-in).
    pub path: Option<PathBuf>,
}

/// When tracking periods roll over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// Hour of the daily reset, UTC.
    pub hour_utc: u32,
    /// Weekday of the weekly reset.
    pub weekly_day: Weekday,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            hour_utc: 10,
            weekly_day: Weekday::Thu,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Coalescing window for batched task writes, in milliseconds.
    pub debounce_ms: u64,
    /// Identity transitions remembered by the cleanup guard.
    pub cleanup_registry_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            cleanup_registry_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for daily log files (None = stderr only).
    pub dir: Option<PathBuf>,
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            app_name: "roster-tasks".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Config` if the file cannot be read or parsed,
    /// or holds out-of-range values.
    pub fn from_file(path: &Path) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> DomainResult<Self> {
        let config: Config = toml::from_str(content).map_err(|e| DomainError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.reset.hour_utc > 23 {
            return Err(DomainError::Config(format!(
                "reset.hour_utc must be 0..=23, got {}",
                self.reset.hour_utc
            )));
        }
        if self.sync.cleanup_registry_capacity == 0 {
            return Err(DomainError::Config("sync.cleanup_registry_capacity must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reset.hour_utc, 10);
        assert_eq!(config.reset.weekly_day, Weekday::Thu);
        assert_eq!(config.sync.debounce_ms, 1000);
        assert_eq!(config.sync.cleanup_registry_capacity, 64);
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [database]
            path = ":memory:"

            [sync]
            debounce_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, PathBuf::from(":memory:"));
        assert_eq!(config.sync.debounce_ms, 250);
        assert_eq!(config.sync.cleanup_registry_capacity, 64);
        assert_eq!(config.logging.app_name, "roster-tasks");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_toml("[reset]\nhour_utc = 24\n"),
            Err(DomainError::Config(_))
        ));
        assert!(Config::from_toml("not valid toml {{{").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\napp_name = \"planner\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.logging.app_name, "planner");
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_serialized_config_reloads() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
