//! Registry configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! widths used by the v1 schema.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Severity};

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON in '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Schema registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Width of name and column-identifier strings (default: 256)
    #[serde(default = "default_name_length")]
    pub name_length: usize,

    /// Width of metadata blobs (default: 2048)
    #[serde(default = "default_metadata_length")]
    pub metadata_length: usize,

    /// Minimum log severity: trace, info, warn, error, fatal (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_name_length() -> usize {
    256
}

fn default_metadata_length() -> usize {
    2048
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name_length: default_name_length(),
            metadata_length: default_metadata_length(),
            log_level: default_log_level(),
        }
    }
}

impl RegistryConfig {
    /// Loads and validates a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        let config: RegistryConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: display.clone(),
                source,
            })?;
        config.validate()?;

        log_event_with_fields(Event::ConfigLoaded, &[("path", display.as_str())]);
        Ok(config)
    }

    /// Rejects zero widths and unknown log levels.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "name_length",
                reason: "must be greater than zero".into(),
            });
        }
        if self.metadata_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metadata_length",
                reason: "must be greater than zero".into(),
            });
        }
        self.log_severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(|reason| ConfigError::InvalidValue {
                field: "log_level",
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.name_length, 256);
        assert_eq!(config.metadata_length, 2048);
        assert_eq!(config.log_severity().unwrap(), Severity::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RegistryConfig = serde_json::from_str(r#"{"metadata_length": 4096}"#).unwrap();
        assert_eq!(config.name_length, 256);
        assert_eq!(config.metadata_length, 4096);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"name_length": 128, "log_level": "warn"}}"#).unwrap();

        let config = RegistryConfig::load(file.path()).unwrap();
        assert_eq!(config.name_length, 128);
        assert_eq!(config.log_severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = RegistryConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegistryConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let config = RegistryConfig {
            name_length: 0,
            ..RegistryConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "name_length", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let config = RegistryConfig {
            log_level: "chatty".into(),
            ..RegistryConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
