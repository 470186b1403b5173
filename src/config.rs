// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving adaptor settings for hosts and the probe binary.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serial adaptor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptorConfig {
    /// Bluetooth address of the remote serial device.
    pub address: String,

    /// Fixed RFCOMM channel. When unset, the channel is resolved through the
    /// capability's discovery.
    pub channel: Option<u8>,

    /// Optional string the probe binary writes after connecting.
    pub probe_message: Option<String>,
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            channel: None,
            probe_message: None,
        }
    }
}

impl AdaptorConfig {
    /// Load configuration from the platform config dir, creating a default
    /// file on first run.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("btserial-adaptor");

        std::fs::create_dir_all(&config_dir)?;
        Self::load_from(config_dir.join("config.toml"))
    }

    /// Load configuration from `path`, writing a default file if missing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the platform config dir.
    pub fn save(&self) -> Result<()> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("btserial-adaptor");

        std::fs::create_dir_all(&config_dir)?;
        self.save_to(config_dir.join("config.toml"))
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AdaptorConfig {
            address: "AA:BB:CC:DD:EE:FF".into(),
            channel: Some(3),
            probe_message: Some("hello".into()),
        };
        config.save_to(&path).unwrap();

        let loaded = AdaptorConfig::load_from(&path).unwrap();
        assert_eq!(loaded.address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(loaded.channel, Some(3));
        assert_eq!(loaded.probe_message.as_deref(), Some("hello"));
    }

    #[test]
    fn missing_file_yields_default_and_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AdaptorConfig::load_from(&path).unwrap();
        assert!(config.address.is_empty());
        assert!(config.channel.is_none());
        assert!(path.exists());
    }
}
