//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;
use uvr_can_codec::{DeviceSession, NodeId, Reading, SessionConfig};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    /// Session attributes, e.g. `SendInterval = "30"`
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Initial outgoing values, e.g. `SetAnalog01 = "24.5"`
    #[serde(default)]
    pub set: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_node_id")]
    pub node_id: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            node_id: default_node_id(),
        }
    }
}

fn default_interface() -> String {
    "can0".to_string()
}

fn default_node_id() -> u8 {
    1
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

impl AppConfig {
    /// Create the device session and apply all attributes and set values.
    ///
    /// Entries that fail validation are logged and skipped. The returned
    /// readings are the outgoing values that were set.
    pub fn build_session(&self, now: Instant) -> Result<(DeviceSession, Vec<Reading>)> {
        let node = NodeId::new(self.device.node_id)
            .with_context(|| format!("Invalid device node id {}", self.device.node_id))?;
        let mut session = DeviceSession::new(node, SessionConfig::new());

        for (name, value) in &self.attributes {
            if let Err(e) = session.apply_attribute(name, value, now) {
                log::warn!("Ignoring attribute {}: {}", name, e);
            }
        }

        let mut readings = Vec::new();
        for (name, value) in &self.set {
            match session.apply_set(name, value) {
                Ok(reading) => readings.push(reading),
                Err(e) => log::warn!("Ignoring {}: {}", name, e),
            }
        }

        log::debug!(
            "Session for node {} built with {} attributes and {} set values",
            node,
            self.attributes.len(),
            readings.len()
        );
        Ok((session, readings))
    }
}
