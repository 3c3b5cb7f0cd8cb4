//! HomeStats Common Library
//!
//! Shared types and utilities for HomeStats sensor bridges:
//!
//! - [`sensor`] - Wire data model (`Sensor`, `SensorPayload`, `sent` timestamp format)
//! - [`serialization`] - JSON/CBOR encoding and decoding
//! - [`config`] - Zenoh and logging configuration sections
//! - [`session`] - Zenoh session management
//! - [`keyexpr`] - Key expression building and prefix validation
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod keyexpr;
pub mod sensor;
pub mod serialization;
pub mod session;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig, ZenohConfig};
pub use error::{Error, Result};
pub use keyexpr::{KeyExprBuilder, sanitize_segment, validate_prefix};
pub use sensor::{SENT_FORMAT, Sensor, SensorPayload, current_timestamp, parse_sent};
pub use serialization::{Format, decode, encode};
pub use session::connect;

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
///
/// # Example
///
/// ```ignore
/// use homestats_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let initialized = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init(),
    };

    initialized.map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))
}
