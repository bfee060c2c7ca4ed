//! Application configuration

use chrono::{DateTime, Utc};
use harbor_core::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Only signer allowed to replace module parameters
    #[serde(default = "default_authority")]
    pub authority: Address,

    /// Directory of the JSONL event store; events are not persisted when unset
    #[serde(default)]
    pub event_store_path: Option<PathBuf>,

    /// Block time before the first block
    #[serde(default = "default_genesis_time")]
    pub genesis_time: DateTime<Utc>,
}

fn default_authority() -> Address {
    Address::module("gov")
}

fn default_genesis_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_609_459_200, 0).unwrap_or_default()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            event_store_path: None,
            genesis_time: default_genesis_time(),
        }
    }
}

impl AppConfig {
    /// Load and validate a config from a JSON file
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.authority.is_empty() {
            return Err(AppError::InvalidConfig("authority cannot be empty".to_string()));
        }
        if self.genesis_time.timestamp() == 0 {
            return Err(AppError::InvalidConfig("genesis time must be set".to_string()));
        }
        Ok(())
    }
}
