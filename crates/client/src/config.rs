//! Client configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cipherbid_types::Deployments;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Vault deployments keyed by network identifier
    pub deployments: Deployments,
    /// Lifetime of a new decryption authorization
    pub authorization_duration_days: u64,
    /// Key prefix for persisted authorizations
    pub storage_namespace: String,
    /// Delay between receipt polls
    pub receipt_poll_interval_ms: u64,
    /// Receipt polls before giving up on inclusion
    pub receipt_poll_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            deployments: Deployments::default(),
            authorization_duration_days: 365,
            storage_namespace: "cipherbid.decryption-authorization".to_string(),
            receipt_poll_interval_ms: 250,
            receipt_poll_attempts: 120,
        }
    }
}

impl ClientConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.authorization_duration_days, 365);
        assert!(config.deployments.is_empty());
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "deployments": {
                    "31337": {
                        "address": "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0",
                        "chainId": 31337
                    }
                },
                "authorization_duration_days": 7
            }"#,
        )
        .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.authorization_duration_days, 7);
        assert_eq!(config.receipt_poll_attempts, 120);
        assert_eq!(
            config.deployments.resolve(Some(31337)).address,
            Some(Address::repeat_byte(0xc0))
        );
    }
}
