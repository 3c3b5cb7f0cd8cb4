//! Configuration traits and utilities.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{BridgeError, Result};
use crate::{LoggingConfig, ZenohConfig};

/// Trait for bridge configuration types.
///
/// Implement this trait for a bridge's configuration struct to get
/// loading, validation, and access to the sections every bridge shares.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use homestats_bridge_framework::{BridgeConfig, ZenohConfig, LoggingConfig};
///
/// #[derive(Debug, Deserialize)]
/// pub struct MyBridgeConfig {
///     pub zenoh: ZenohConfig,
///     pub logging: LoggingConfig,
///     pub source: MySourceConfig,
/// }
///
/// impl BridgeConfig for MyBridgeConfig {
///     fn zenoh(&self) -> &ZenohConfig {
///         &self.zenoh
///     }
///
///     fn logging(&self) -> &LoggingConfig {
///         &self.logging
///     }
///
///     fn key_prefix(&self) -> &str {
///         &self.source.key_prefix
///     }
/// }
/// ```
pub trait BridgeConfig: Sized + DeserializeOwned {
    /// Get the Zenoh configuration.
    fn zenoh(&self) -> &ZenohConfig;

    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Get the key expression prefix for this bridge.
    fn key_prefix(&self) -> &str;

    /// Validate the configuration.
    ///
    /// Called by [`load`](Self::load) and [`parse`](Self::parse). The default
    /// checks that the key prefix is a literal key expression.
    fn validate(&self) -> Result<()> {
        homestats_common::validate_prefix(self.key_prefix())?;
        Ok(())
    }

    /// Parse and validate configuration from JSON5 text.
    fn parse(content: &str) -> Result<Self> {
        let config: Self = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    ///
    /// Supports JSON5 format. Calls [`validate`](Self::validate) after loading.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        #[serde(default)]
        zenoh: ZenohConfig,
        #[serde(default)]
        logging: LoggingConfig,
        key_prefix: String,
    }

    impl BridgeConfig for TestConfig {
        fn zenoh(&self) -> &ZenohConfig {
            &self.zenoh
        }

        fn logging(&self) -> &LoggingConfig {
            &self.logging
        }

        fn key_prefix(&self) -> &str {
            &self.key_prefix
        }
    }

    #[test]
    fn test_config_not_found() {
        let result = TestConfig::load("/nonexistent/path.json5");
        assert!(matches!(result, Err(BridgeError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_parse_valid() {
        let config = TestConfig::parse(r#"{ key_prefix: "homestats/test" }"#).unwrap();
        assert_eq!(config.key_prefix(), "homestats/test");
        assert_eq!(config.zenoh().mode, "peer");
    }

    #[test]
    fn test_parse_rejects_wildcard_prefix() {
        let result = TestConfig::parse(r#"{ key_prefix: "homestats/**" }"#);
        assert!(matches!(result, Err(BridgeError::ConfigValidation(_))));
    }

    #[test]
    fn test_parse_syntax_error() {
        let result = TestConfig::parse("{ key_prefix: ");
        assert!(matches!(result, Err(BridgeError::ConfigParse(_))));
    }
}
