//! Client configuration.

use abacus_core::{Address, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Address of the deployed calculator contract.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xe9356A7766765d69B2035A431Ab4dd303C978147";

/// Settings for a [`Calculator`](crate::Calculator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Hex address of the calculator contract.
    pub contract_address: String,
    /// Upper bound on the wait for a transaction receipt. `None` waits indefinitely.
    pub receipt_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            receipt_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Reads a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("could not read '{}': {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.contract_address()?;
        Ok(config)
    }

    /// Parses the configured contract address.
    pub fn contract_address(&self) -> Result<Address> {
        Address::from_str(self.contract_address.trim()).map_err(|e| {
            Error::Config(format!(
                "invalid contract address '{}': {e}",
                self.contract_address
            ))
        })
    }

    pub fn receipt_timeout(&self) -> Option<Duration> {
        self.receipt_timeout_ms.map(Duration::from_millis)
    }
}
