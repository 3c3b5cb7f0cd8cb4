use zenoh::Session;

use crate::config::ZenohConfig;
use crate::error::{Error, Result};

/// Build the native Zenoh configuration from ours.
pub fn zenoh_config(config: &ZenohConfig) -> Result<zenoh::Config> {
    let mut zenoh_config = zenoh::Config::default();

    if !matches!(config.mode.as_str(), "client" | "peer" | "router") {
        return Err(Error::Config(format!(
            "Invalid Zenoh mode: '{}'. Expected 'client', 'peer', or 'router'",
            config.mode
        )));
    }

    zenoh_config
        .insert_json5("mode", &format!("\"{}\"", config.mode))
        .map_err(|e| Error::Config(format!("Failed to set mode: {}", e)))?;

    insert_endpoints(&mut zenoh_config, "connect/endpoints", &config.connect)?;
    insert_endpoints(&mut zenoh_config, "listen/endpoints", &config.listen)?;

    Ok(zenoh_config)
}

fn insert_endpoints(zenoh_config: &mut zenoh::Config, key: &str, endpoints: &[String]) -> Result<()> {
    if endpoints.is_empty() {
        return Ok(());
    }

    let json = serde_json::to_string(endpoints)
        .map_err(|e| Error::Config(format!("Failed to serialize {}: {}", key, e)))?;

    zenoh_config
        .insert_json5(key, &json)
        .map_err(|e| Error::Config(format!("Failed to set {}: {}", key, e)))
}

/// Open a Zenoh session using the provided configuration.
pub async fn connect(config: &ZenohConfig) -> Result<Session> {
    let zenoh_config = zenoh_config(config)?;

    tracing::info!(
        mode = %config.mode,
        connect = ?config.connect,
        listen = ?config.listen,
        "Connecting to Zenoh"
    );

    let session = zenoh::open(zenoh_config).await?;

    tracing::info!(zid = %session.zid(), "Connected to Zenoh");

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_mode() {
        let config = ZenohConfig {
            mode: "broker".to_string(),
            ..Default::default()
        };

        let err = zenoh_config(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid Zenoh mode"));
    }

    #[test]
    fn test_accepts_client_with_endpoints() {
        let config = ZenohConfig {
            mode: "client".to_string(),
            connect: vec!["tcp/127.0.0.1:7447".to_string()],
            listen: Vec::new(),
        };

        assert!(zenoh_config(&config).is_ok());
    }
}
