//! Bridge status reporting.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::publisher::Publisher;

/// Bridge status information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Bridge name (e.g., "aida64").
    pub bridge: String,
    /// Bridge version.
    pub version: String,
    /// Current status ("running" or "offline").
    pub status: String,
    /// Additional bridge-specific metadata.
    #[serde(flatten)]
    pub metadata: serde_json::Value,
}

impl BridgeStatus {
    fn with_state(bridge: impl Into<String>, version: impl Into<String>, status: &str) -> Self {
        Self {
            bridge: bridge.into(),
            version: version.into(),
            status: status.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Create a new status with "running" state.
    pub fn running(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_state(bridge, version, "running")
    }

    /// Create a status with "offline" state.
    pub fn offline(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_state(bridge, version, "offline")
    }

    /// Add metadata to the status.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Publish this status to `{key_prefix}/@/status`.
    pub async fn publish(&self, publisher: &Publisher) -> Result<()> {
        let key = publisher.build_key("@/status");
        publisher.publish_json(&key, self).await
    }
}

/// Announces a bridge's lifecycle on its publisher's status key.
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    bridge_name: String,
    version: String,
    metadata: Option<serde_json::Value>,
}

impl StatusPublisher {
    /// Create a new status publisher.
    pub fn new(bridge_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            bridge_name: bridge_name.into(),
            version: version.into(),
            metadata: None,
        }
    }

    /// Metadata attached to every "running" announcement.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Build the "running" status, including metadata.
    pub fn running_status(&self) -> BridgeStatus {
        let status = BridgeStatus::running(&self.bridge_name, &self.version);
        match &self.metadata {
            Some(meta) => status.with_metadata(meta.clone()),
            None => status,
        }
    }

    /// Publish "running" status.
    pub async fn publish_running(&self, publisher: &Publisher) -> Result<()> {
        self.running_status().publish(publisher).await
    }

    /// Publish "offline" status.
    pub async fn publish_offline(&self, publisher: &Publisher) -> Result<()> {
        BridgeStatus::offline(&self.bridge_name, &self.version)
            .publish(publisher)
            .await
    }
}
