//! AIDA64 bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use homestats_bridge_framework::{BridgeConfig, BridgeError, Format, LoggingConfig, ZenohConfig};
use homestats_common::KeyExprBuilder;

use crate::classifier::SensorTableConfig;
use crate::snapshot::SourceConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aida64BridgeConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Sensor bridge settings.
    #[serde(default)]
    pub aida64: Aida64Config,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig for Aida64BridgeConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn key_prefix(&self) -> &str {
        &self.aida64.key_prefix
    }

    fn validate(&self) -> homestats_bridge_framework::Result<()> {
        homestats_common::validate_prefix(self.key_prefix())?;

        if self.aida64.poll_interval_ms == 0 {
            return Err(BridgeError::validation("aida64.poll_interval_ms must be greater than 0"));
        }

        if self.aida64.get_hostname().is_empty() {
            return Err(BridgeError::validation("aida64.hostname resolves to an empty name"));
        }

        self.aida64
            .sensors
            .validate()
            .map_err(|e| BridgeError::validation(format!("aida64.sensors: {}", e)))
    }
}

/// Settings of the sensor pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aida64Config {
    /// Key prefix, payloads go to `{key_prefix}/{hostname}/sensors`.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Host segment of the key, "auto" for the system hostname.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Time between two published payloads.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Payload encoding.
    #[serde(default)]
    pub serialization: Format,

    /// Where the sensor dump is read from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Identifier and pattern tables.
    #[serde(default)]
    pub sensors: SensorTableConfig,
}

fn default_key_prefix() -> String {
    "homestats/aida64".to_string()
}

fn default_hostname() -> String {
    "auto".to_string()
}

fn default_poll_interval_ms() -> u64 {
    3000
}

impl Default for Aida64Config {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            hostname: default_hostname(),
            poll_interval_ms: default_poll_interval_ms(),
            serialization: Format::default(),
            source: SourceConfig::default(),
            sensors: SensorTableConfig::default(),
        }
    }
}

impl Aida64Config {
    /// The configured hostname, or the system hostname for "auto".
    pub fn get_hostname(&self) -> String {
        if self.hostname == "auto" {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string())
        } else {
            self.hostname.clone()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Key the payloads of this host are published on.
    pub fn sensors_key(&self) -> String {
        KeyExprBuilder::with_prefix(&self.key_prefix).sensors_key(&self.get_hostname())
    }
}
