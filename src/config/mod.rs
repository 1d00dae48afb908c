//! Configuration
//!
//! Endpoints and tuning knobs are loaded from a JSON file and passed
//! explicitly into the session constructors; there is no process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::multisig::DEFAULT_MAX_DEPTH;

/// Default number of days before a pending transaction expires
pub const DEFAULT_EXPIRATION_DAYS: i64 = 14;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the coordinating relay, including the API version path
    pub relay_url: String,
    /// Base URL of the ledger node
    pub node_url: String,
    /// Hex-encoded private key file for the local signer
    pub key_file: Option<PathBuf>,
    /// Days until a newly created pending transaction expires
    pub tx_expiration_days: i64,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Bound on alias nesting depth during resolution
    pub max_resolution_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:8080/v1".to_string(),
            node_url: "http://127.0.0.1:9650".to_string(),
            key_file: None,
            tx_expiration_days: DEFAULT_EXPIRATION_DAYS,
            request_timeout_secs: 30,
            max_resolution_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from a file if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("config file {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Write the configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tx_expiration_days, DEFAULT_EXPIRATION_DAYS);
        assert_eq!(config.max_resolution_depth, DEFAULT_MAX_DEPTH);
        assert!(config.key_file.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.relay_url = "https://relay.example.com/v1".to_string();
        config.tx_expiration_days = 7;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.relay_url, "https://relay.example.com/v1");
        assert_eq!(loaded.tx_expiration_days, 7);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"relayUrl": "https://partial.example/v1"}"#).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.relay_url, "https://partial.example/v1");
        assert_eq!(loaded.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let loaded = Config::load_or_default(&path).unwrap();
        assert_eq!(loaded.relay_url, Config::default().relay_url);
    }
}
