//! Configuration module
//!
//! Supports YAML configuration files with module-based organization; command
//! line flags override file values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network configuration
    #[serde(default)]
    pub network: NetworkConfig,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Merge with another config (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        self.network.merge(other.network);
        self.storage.merge(other.storage);
        self.log.merge(other.log);
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Redis server listen address
    pub listen_addr: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:6379".to_string(),
        }
    }
}

impl NetworkConfig {
    fn merge(&mut self, other: Self) {
        if !other.listen_addr.is_empty() {
            self.listen_addr = other.listen_addr;
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data storage directory
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, other: Self) {
        if !other.data_dir.as_os_str().is_empty() {
            self.data_dir = other.data_dir;
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    fn merge(&mut self, other: Self) {
        if !other.level.is_empty() {
            self.level = other.level;
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.listen_addr, "127.0.0.1:6379");
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_yaml_partial_sections() {
        let config = Config::from_yaml("network:\n  listen_addr: 0.0.0.0:7000\n").unwrap();
        assert_eq!(config.network.listen_addr, "0.0.0.0:7000");
        // untouched sections keep their defaults
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = Config::default();
        let other = Config::from_yaml("log:\n  level: debug\n").unwrap();
        base.merge(other);
        assert_eq!(base.log.level, "debug");
        assert_eq!(base.network.listen_addr, "127.0.0.1:6379");
    }

    #[test]
    fn test_bad_yaml_rejected() {
        assert!(matches!(
            Config::from_yaml(": not yaml"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
