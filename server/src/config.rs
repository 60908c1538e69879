use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server tuning, usually read from a TOML file; missing keys fall back to defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerConfig {
    /// Delay between the second flip of a turn and its resolution.
    pub resolve_delay_ms: u64,
    /// Random room codes tried before giving up on creating a room.
    pub room_id_attempts: u32,
    /// Fixed seed for decks and room codes, random when absent.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            resolve_delay_ms: 800,
            room_id_attempts: 64,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.resolve_delay_ms)
    }
}

impl FromStr for ServerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
