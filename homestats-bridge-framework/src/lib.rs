//! HomeStats Bridge Framework
//!
//! Common abstractions for building bridges that publish sensor payloads to Zenoh.
//!
//! # Overview
//!
//! This framework provides:
//! - [`BridgeConfig`] trait for configuration loading and validation
//! - [`BridgeRunner`] for managing bridge lifecycle (startup, shutdown, signal handling)
//! - [`Publisher`] for publishing payloads to Zenoh with automatic serialization
//! - [`BridgeArgs`] for common CLI argument parsing
//! - [`BridgeStatus`] for standardized status reporting
//!
//! # Example
//!
//! ```ignore
//! use homestats_bridge_framework::run_bridge;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_bridge::<MyBridgeConfig, _>("mybridge", "mybridge.json5", |runner| {
//!         let shutdown = runner.shutdown_signal();
//!         runner.spawn_with_error("poller", my_worker(shutdown));
//!         Ok(())
//!     })
//!     .await
//! }
//! ```

mod args;
mod config;
mod error;
mod publisher;
mod runner;
mod status;

pub use args::BridgeArgs;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use publisher::{PublishStats, Publisher};
pub use runner::{BridgeRunner, run_bridge};
pub use status::{BridgeStatus, StatusPublisher};

// Re-export commonly used types from homestats-common
pub use homestats_common::{Format, LoggingConfig, Sensor, SensorPayload, ZenohConfig};
