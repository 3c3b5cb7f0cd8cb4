//! Destination of encoded payloads.

use std::future::Future;

use homestats_bridge_framework::{BridgeError, Publisher, StatusPublisher};

/// Something the scheduler can hand encoded payloads to.
pub trait PayloadSink: Send {
    /// Try to connect. Returns whether the sink is connected afterwards.
    fn connect(&mut self) -> impl Future<Output = bool> + Send;

    fn connected(&self) -> bool;

    /// Publish one encoded payload.
    fn publish(&mut self, payload: Vec<u8>) -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;
}

/// Publishes payloads on `{key_prefix}/{hostname}/sensors` and announces the
/// bridge on `{key_prefix}/@/status`.
#[derive(Debug)]
pub struct ZenohSink {
    publisher: Publisher,
    key: String,
    status: StatusPublisher,
}

impl ZenohSink {
    /// `key` is the full key expression payloads are put on.
    pub fn new(publisher: Publisher, key: impl Into<String>, status: StatusPublisher) -> Self {
        Self {
            publisher,
            key: key.into(),
            status,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PayloadSink for ZenohSink {
    async fn connect(&mut self) -> bool {
        if self.publisher.is_connected() {
            return true;
        }

        match self.publisher.connect().await {
            Ok(()) => {
                tracing::info!(key = %self.key, "Connected to Zenoh");
                if let Err(e) = self.status.publish_running(&self.publisher).await {
                    tracing::warn!(error = %e, "Failed to publish bridge status");
                }
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to connect to Zenoh");
                false
            }
        }
    }

    fn connected(&self) -> bool {
        self.publisher.is_connected()
    }

    async fn publish(&mut self, payload: Vec<u8>) -> Result<(), BridgeError> {
        // Reconnect lazily after a failed start
        if !self.connect().await {
            return Err(BridgeError::NotConnected);
        }

        self.publisher.publish_raw(&self.key, payload).await
    }

    async fn disconnect(&mut self) {
        if !self.publisher.is_connected() {
            return;
        }

        if let Err(e) = self.status.publish_offline(&self.publisher).await {
            tracing::warn!(error = %e, "Failed to publish offline status");
        }
        self.publisher.close().await;
        tracing::info!("Disconnected from Zenoh");
    }
}
