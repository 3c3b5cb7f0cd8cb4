//! Payload publisher for Zenoh.

use std::sync::Arc;

use serde::Serialize;

use homestats_common::{ZenohConfig, connect};

use crate::error::{BridgeError, Result};

/// Publisher for sending sensor payloads to Zenoh.
///
/// The session is opened on [`connect`](Self::connect) rather than at
/// construction, so a bridge can start while the router is unreachable and
/// keep its own schedule. Publishing while disconnected fails with
/// [`BridgeError::NotConnected`].
#[derive(Debug)]
pub struct Publisher {
    zenoh: ZenohConfig,
    key_prefix: String,
    session: Option<Arc<zenoh::Session>>,
}

impl Publisher {
    /// Create a disconnected publisher.
    pub fn new(zenoh: ZenohConfig, key_prefix: impl Into<String>) -> Self {
        Self {
            zenoh,
            key_prefix: key_prefix.into(),
            session: None,
        }
    }

    /// Whether a session is currently open.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Build a full key expression from a suffix.
    pub fn build_key(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.key_prefix.clone()
        } else {
            format!("{}/{}", self.key_prefix, suffix)
        }
    }

    /// Open the Zenoh session. Does nothing when already connected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let session = connect(&self.zenoh)
            .await
            .map_err(|e| BridgeError::ZenohConnection(e.to_string()))?;
        self.session = Some(Arc::new(session));

        Ok(())
    }

    /// Close the session, if any.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "Error closing Zenoh session");
            }
        }
    }

    fn session(&self) -> Result<&Arc<zenoh::Session>> {
        self.session.as_ref().ok_or(BridgeError::NotConnected)
    }

    /// Publish already encoded bytes to a full key.
    pub async fn publish_raw(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.session()?
            .put(key, payload)
            .await
            .map_err(|e| BridgeError::Publish {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// Publish a JSON value to a full key.
    pub async fn publish_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(key, payload).await
    }
}

/// Running totals of publish attempts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    /// Number of successful publishes.
    pub success: usize,
    /// Number of failed publishes.
    pub failed: usize,
}

impl PublishStats {
    /// Total number of attempted publishes.
    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}
