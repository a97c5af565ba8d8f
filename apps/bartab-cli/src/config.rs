//! # Application Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! defaults ──► bartab.toml ──► BARTAB_* env vars ──► validate()
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # bartab.toml
//! [database]
//! path = "/srv/bartab/bartab.db"
//! keep_snapshots = 200
//!
//! [engine]
//! allow_duplicate_table_names = false
//! audit_capacity = 1000
//! notification_capacity = 50
//! ```
//!
//! ## Environment Variables
//! - `BARTAB_DB_PATH`
//! - `BARTAB_ALLOW_DUPLICATE_TABLES` (`true` / `false`)
//! - `BARTAB_AUDIT_CAPACITY`
//! - `BARTAB_KEEP_SNAPSHOTS`

use bartab_core::EngineConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

const CONFIG_FILE: &str = "bartab.toml";
const DB_FILE: &str = "bartab.db";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "bartab", "bartab")
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Default: platform data dir, else `./bartab.db`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Snapshots kept after each save; older ones are pruned.
    #[serde(default = "default_keep_snapshots")]
    pub keep_snapshots: u32,
}

fn default_db_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DB_FILE))
}

fn default_keep_snapshots() -> u32 {
    200
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            keep_snapshots: default_keep_snapshots(),
        }
    }
}

/// Snake-case mirror of [`EngineConfig`] for the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub allow_duplicate_table_names: bool,
    pub audit_capacity: usize,
    pub notification_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let engine = EngineConfig::default();
        EngineSettings {
            allow_duplicate_table_names: engine.allow_duplicate_table_names,
            audit_capacity: engine.audit_capacity,
            notification_capacity: engine.notification_capacity,
        }
    }
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        EngineConfig {
            allow_duplicate_table_names: settings.allow_duplicate_table_names,
            audit_capacity: settings.audit_capacity,
            notification_capacity: settings.notification_capacity,
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub engine: EngineSettings,
}

impl AppConfig {
    /// Loads defaults, then the config file (explicit path or the platform
    /// config dir), then environment overrides, then validates.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(config_path: Option<&Path>) -> CliResult<Self> {
        let mut config = match config_path {
            Some(path) if !path.exists() => {
                return Err(CliError::InvalidConfig(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> CliResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Applies `BARTAB_*` overrides read through `var`.
    ///
    /// Unparsable values are logged and ignored.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("BARTAB_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }
        if let Some(allow) = parse_var(&var, "BARTAB_ALLOW_DUPLICATE_TABLES") {
            self.engine.allow_duplicate_table_names = allow;
        }
        if let Some(capacity) = parse_var(&var, "BARTAB_AUDIT_CAPACITY") {
            self.engine.audit_capacity = capacity;
        }
        if let Some(keep) = parse_var(&var, "BARTAB_KEEP_SNAPSHOTS") {
            self.database.keep_snapshots = keep;
        }
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(CliError::InvalidConfig("database.path is empty".into()));
        }
        if self.database.keep_snapshots == 0 {
            return Err(CliError::InvalidConfig(
                "database.keep_snapshots must be at least 1".into(),
            ));
        }
        if self.engine.audit_capacity == 0 {
            return Err(CliError::InvalidConfig(
                "engine.audit_capacity must be at least 1".into(),
            ));
        }
        if self.engine.notification_capacity == 0 {
            return Err(CliError::InvalidConfig(
                "engine.notification_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::from(&self.engine)
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
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
    fn test_defaults_match_engine() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine_config(), EngineConfig::default());
        assert_eq!(config.database.keep_snapshots, 200);
        assert!(config.database.path.ends_with("bartab.db"));
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            allow_duplicate_table_names = false
            "#,
        )
        .unwrap();

        assert!(!config.engine.allow_duplicate_table_names);
        assert_eq!(config.engine.audit_capacity, 1000);
        assert_eq!(config.database, DatabaseSettings::default());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config: AppConfig = toml::from_str(
            r#"
            [database]
            path = "/from/file.db"
            keep_snapshots = 10
            "#,
        )
        .unwrap();

        config.apply_overrides(env(&[
            ("BARTAB_DB_PATH", "/from/env.db"),
            ("BARTAB_ALLOW_DUPLICATE_TABLES", "false"),
            ("BARTAB_AUDIT_CAPACITY", "25"),
        ]));

        assert_eq!(config.database.path, PathBuf::from("/from/env.db"));
        assert_eq!(config.database.keep_snapshots, 10);
        assert!(!config.engine.allow_duplicate_table_names);
        assert_eq!(config.engine_config().audit_capacity, 25);
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&[("BARTAB_KEEP_SNAPSHOTS", "lots")]));
        assert_eq!(config.database.keep_snapshots, 200);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.database.keep_snapshots = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.engine.audit_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/bartab.toml")));
        assert!(matches!(result, Err(CliError::InvalidConfig(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[engine]"));
    }
}
