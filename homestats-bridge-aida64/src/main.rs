//! Zenoh bridge for AIDA64 hardware sensors.
//!
//! Reads the AIDA64 sensor dump and publishes normalized payloads to Zenoh.

use anyhow::Result;
use homestats_bridge_framework::{Publisher, StatusPublisher, run_bridge};

use homestats_bridge_aida64::classifier::SensorClassifier;
use homestats_bridge_aida64::config::Aida64BridgeConfig;
use homestats_bridge_aida64::scheduler::PublishScheduler;
use homestats_bridge_aida64::sink::ZenohSink;

#[tokio::main]
async fn main() -> Result<()> {
    run_bridge::<Aida64BridgeConfig, _>("aida64", "aida64.json5", |runner| {
        let zenoh = runner.config().zenoh.clone();
        let aida64 = runner.config().aida64.clone();
        let hostname = aida64.get_hostname();

        let classifier = SensorClassifier::new(&aida64.sensors)?;

        let status = StatusPublisher::new(runner.name(), runner.version()).with_metadata(
            serde_json::json!({
                "hostname": hostname,
                "source": aida64.source.describe(),
                "poll_interval_ms": aida64.poll_interval_ms,
                "identifiers": classifier.identifier_count(),
                "groups": classifier.groups().len(),
            }),
        );

        let publisher = Publisher::new(zenoh, &aida64.key_prefix);
        let sink = ZenohSink::new(publisher, aida64.sensors_key(), status);

        tracing::info!(
            key = %sink.key(),
            source = %aida64.source.describe(),
            interval_ms = aida64.poll_interval_ms,
            "AIDA64 bridge configured"
        );

        let mut scheduler = PublishScheduler::new(aida64.source.build(), classifier, sink)
            .with_interval(aida64.poll_interval())
            .with_format(aida64.serialization);

        let shutdown = runner.shutdown_signal();
        runner.spawn_with_error("aida64", async move { scheduler.run(shutdown).await });

        Ok(())
    })
    .await
}
