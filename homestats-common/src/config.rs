use serde::{Deserialize, Serialize};

/// Zenoh connection settings shared by every bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZenohConfig {
    /// Zenoh mode: "client", "peer", or "router".
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Endpoints to connect to (for client mode).
    #[serde(default)]
    pub connect: Vec<String>,

    /// Endpoints to listen on (for peer/router mode).
    #[serde(default)]
    pub listen: Vec<String>,
}

fn default_mode() -> String {
    "peer".to_string()
}

impl Default for ZenohConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            connect: Vec::new(),
            listen: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Same settings with a different level.
    pub fn with_level(&self, level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sections {
        #[serde(default)]
        zenoh: ZenohConfig,
        #[serde(default)]
        logging: LoggingConfig,
    }

    #[test]
    fn test_parse_sections() {
        let json5 = r#"
        {
            // a router on the LAN
            zenoh: {
                mode: "client",
                connect: ["tcp/192.168.0.62:7447"],
            },
            logging: {
                level: "debug",
            },
        }
        "#;

        let config: Sections = json5::from_str(json5).unwrap();

        assert_eq!(config.zenoh.mode, "client");
        assert_eq!(config.zenoh.connect, vec!["tcp/192.168.0.62:7447"]);
        assert!(config.zenoh.listen.is_empty());
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_defaults() {
        let config: Sections = json5::from_str("{}").unwrap();

        assert_eq!(config.zenoh, ZenohConfig::default());
        assert_eq!(config.zenoh.mode, "peer");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_json_logging_format() {
        let config: Sections =
            json5::from_str(r#"{ logging: { level: "warn", format: "json" } }"#).unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);

        let overridden = config.logging.with_level("trace");
        assert_eq!(overridden.level, "trace");
        assert_eq!(overridden.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        let result: Result<Sections, _> = json5::from_str(r#"{ logging: { format: "xml" } }"#);
        assert!(result.is_err());
    }
}
