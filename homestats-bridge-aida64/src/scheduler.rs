//! The periodic acquire, classify, publish loop.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use homestats_bridge_framework::{BridgeError, Format, PublishStats, SensorPayload};
use homestats_common::encode;

use crate::aggregator::aggregate;
use crate::classifier::{ClassifierError, SensorClassifier};
use crate::parser::{ParseError, RawRecord, parse};
use crate::sink::PayloadSink;
use crate::snapshot::{SnapshotError, SnapshotSource};

/// Default time between two cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

/// A recoverable failure that abandons one cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] homestats_common::Error),
}

/// A failure that prevents the scheduler from starting.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid sensor configuration: {0}")]
    Configuration(#[from] ClassifierError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// What happened during one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Published { sensors: usize },
    Skipped(PipelineError),
    PublishFailed(BridgeError),
}

/// Running totals over all cycles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub publish: PublishStats,
    pub skipped: usize,
}

impl CycleStats {
    pub fn cycles(&self) -> usize {
        self.publish.total() + self.skipped
    }
}

/// Drives the pipeline on a fixed interval until shutdown.
///
/// # Example
///
/// ```ignore
/// let mut scheduler = PublishScheduler::new(source, classifier, sink)
///     .with_interval(Duration::from_millis(3000));
/// scheduler.run(runner.shutdown_signal()).await?;
/// ```
pub struct PublishScheduler<S, K> {
    source: S,
    classifier: SensorClassifier,
    sink: K,
    format: Format,
    interval: Duration,
    state: SchedulerState,
    stats: CycleStats,
}

impl<S: SnapshotSource, K: PayloadSink> PublishScheduler<S, K> {
    pub fn new(source: S, classifier: SensorClassifier, sink: K) -> Self {
        Self {
            source,
            classifier,
            sink,
            format: Format::default(),
            interval: DEFAULT_INTERVAL,
            state: SchedulerState::Idle,
            stats: CycleStats::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    fn read_records(&mut self) -> Result<Vec<RawRecord>, PipelineError> {
        let raw = self.source.read_snapshot()?;
        Ok(parse(&raw)?)
    }

    /// Acquire one snapshot and build its payload, stamped with the current time.
    ///
    /// Sensors are ordered: identifier table hits, group max/min, disk temperatures.
    pub fn collect(&mut self) -> Result<SensorPayload, PipelineError> {
        let records = self.read_records()?;
        let classified = self.classifier.classify(&records);

        let derived = aggregate(
            &classified.disk_temps,
            self.classifier.disk_prefix(),
            self.classifier.groups(),
        );

        let mut sensors = classified.sensors;
        sensors.extend(derived);

        Ok(SensorPayload::new(sensors))
    }

    /// Run one cycle. Never fails; the outcome is logged and counted.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let encoded = self.collect().and_then(|payload| {
            let bytes = encode(&payload, self.format)?;
            Ok((payload.len(), bytes))
        });

        let outcome = match encoded {
            Ok((sensors, bytes)) => match self.sink.publish(bytes).await {
                Ok(()) => {
                    self.stats.publish.success += 1;
                    CycleOutcome::Published { sensors }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to publish payload");
                    self.stats.publish.failed += 1;
                    CycleOutcome::PublishFailed(e)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Skipping cycle");
                self.stats.skipped += 1;
                CycleOutcome::Skipped(e)
            }
        };

        tracing::debug!(
            published = self.stats.publish.success,
            failed = self.stats.publish.failed,
            skipped = self.stats.skipped,
            "Cycle complete"
        );

        outcome
    }

    /// Check the pattern groups against a real snapshot.
    ///
    /// Acquisition and parse failures are retried every interval. Returns
    /// `Ok(false)` when shutdown arrives before a snapshot was obtained.
    pub async fn preflight(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<bool, SchedulerError> {
        loop {
            if stop_requested(shutdown) {
                return Ok(false);
            }

            match self.read_records() {
                Ok(records) => {
                    self.classifier.validate(&records)?;
                    tracing::info!(
                        records = records.len(),
                        groups = self.classifier.groups().len(),
                        "Sensor configuration validated"
                    );
                    return Ok(true);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = self.interval.as_millis() as u64,
                        "Startup snapshot unavailable, retrying"
                    );
                }
            }

            if !wait(self.interval, shutdown).await {
                return Ok(false);
            }
        }
    }

    /// Validate, connect, then publish every interval until `shutdown` flips.
    ///
    /// A cycle in progress always completes before the loop exits.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), SchedulerError> {
        match self.preflight(&mut shutdown).await {
            Ok(true) => {}
            Ok(false) => {
                self.state = SchedulerState::Stopped;
                return Ok(());
            }
            Err(e) => {
                self.state = SchedulerState::Stopped;
                return Err(e);
            }
        }

        if !self.sink.connect().await {
            tracing::warn!("Publisher not connected, will retry on publish");
        }

        self.state = SchedulerState::Running;
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Publishing sensors");

        loop {
            if stop_requested(&shutdown) {
                break;
            }

            self.run_cycle().await;

            if !wait(self.interval, &mut shutdown).await {
                break;
            }
        }

        self.state = SchedulerState::Stopping;
        self.sink.disconnect().await;
        self.state = SchedulerState::Stopped;

        tracing::info!(
            published = self.stats.publish.success,
            failed = self.stats.publish.failed,
            skipped = self.stats.skipped,
            "Scheduler stopped"
        );

        Ok(())
    }
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Sleep for `interval`. Returns `false` if shutdown was signalled first.
async fn wait(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(interval) => true,
        _ = shutdown.wait_for(|stopping| *stopping) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use homestats_bridge_framework::Sensor;
    use homestats_common::decode;

    use crate::classifier::SensorTableConfig;
    use crate::snapshot::StaticSource;

    const DUMP: &str = "\
        <sys><id>SDATE</id><label>Date</label><value>16.10.2026</value></sys>\
        <sys><id>SCPUCK</id><label>CPU Clock</label><value>3593</value></sys>\
        <sys><id>SCC-1-1</id><label>Core #1 Clock</label><value>3200</value></sys>\
        <sys><id>SCC-1-2</id><label>Core #2 Clock</label><value>3400</value></sys>\
        <sys><id>SCC-1-3</id><label>Core #3 Clock</label><value>3100</value></sys>\
        <sys><id>SCPU1UTI</id><label>CPU1 Utilization</label><value>12</value></sys>\
        <sys><id>SCPU2UTI</id><label>CPU2 Utilization</label><value>40</value></sys>\
        <temp><id>TCPUDIO</id><label>CPU Diode</label><value>48</value></temp>\
        <temp><id>THDD12</id><label>Disk 12</label><value>41.0</value></temp>\
        <temp><id>THDD7</id><label>Disk 7</label><value>39.5</value></temp>";

    #[derive(Debug, Default, Clone)]
    struct MockSink {
        published: Arc<Mutex<Vec<Vec<u8>>>>,
        disconnects: Arc<AtomicUsize>,
        events: Arc<Mutex<Vec<&'static str>>>,
        connected: bool,
        refuse: bool,
        delay: Duration,
    }

    impl MockSink {
        fn refusing() -> Self {
            Self {
                refuse: true,
                ..Default::default()
            }
        }

        /// Each publish takes `delay` to complete.
        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }

        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }

        fn published(&self) -> Vec<Vec<u8>> {
            self.published.lock().unwrap().clone()
        }
    }

    impl PayloadSink for MockSink {
        async fn connect(&mut self) -> bool {
            self.connected = !self.refuse;
            self.connected
        }

        fn connected(&self) -> bool {
            self.connected
        }

        async fn publish(&mut self, payload: Vec<u8>) -> Result<(), BridgeError> {
            if self.refuse {
                return Err(BridgeError::NotConnected);
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.published.lock().unwrap().push(payload);
            self.events.lock().unwrap().push("publish");
            Ok(())
        }

        async fn disconnect(&mut self) {
            self.connected = false;
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("disconnect");
        }
    }

    /// Fails the first `failures` reads, then serves `text`.
    struct FlakySource {
        text: String,
        failures: usize,
        reads: Arc<AtomicUsize>,
    }

    impl SnapshotSource for FlakySource {
        fn read_snapshot(&mut self) -> Result<String, SnapshotError> {
            let read = self.reads.fetch_add(1, Ordering::SeqCst);
            if read < self.failures {
                Err(SnapshotError::Empty)
            } else {
                Ok(self.text.clone())
            }
        }
    }

    fn scheduler<S: SnapshotSource>(source: S, sink: MockSink) -> PublishScheduler<S, MockSink> {
        let classifier = SensorClassifier::new(&SensorTableConfig::reference()).unwrap();
        PublishScheduler::new(source, classifier, sink)
    }

    fn ids(payload: &SensorPayload) -> Vec<&str> {
        payload.payload.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_collect_orders_sensors() {
        let mut scheduler = scheduler(StaticSource::new(DUMP), MockSink::default());
        let payload = scheduler.collect().unwrap();

        assert_eq!(
            ids(&payload),
            vec![
                "[sys][cpu]_clock",
                "[temp][cpu]_measure",
                "[sys][cpu]_clock_core_max",
                "[sys][cpu]_clock_core_min",
                "[sys][cpu]_utilization_thread_max",
                "[sys][cpu]_utilization_thread_min",
                "[temp][hdd]_hdd1",
                "[temp][hdd]_hdd2",
            ]
        );
        assert_eq!(payload.get("[sys][cpu]_clock_core_max").unwrap().value, 3400.0);
        assert_eq!(payload.get("[sys][cpu]_clock_core_min").unwrap().value, 3100.0);
        assert_eq!(payload.get("[temp][hdd]_hdd2").unwrap().value, 39.5);
    }

    #[tokio::test]
    async fn test_cycle_publishes_encoded_payload() {
        let sink = MockSink::default();
        let mut scheduler = scheduler(StaticSource::new(DUMP), sink.clone());

        let outcome = scheduler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Published { sensors: 8 }));

        let published = sink.published();
        assert_eq!(published.len(), 1);

        let payload: SensorPayload = decode(&published[0], Format::Json).unwrap();
        assert_eq!(payload.get("[temp][cpu]_measure"), Some(&Sensor::new("[temp][cpu]_measure", 48.0)));
        assert_eq!(scheduler.stats().publish.success, 1);
    }

    #[tokio::test]
    async fn test_cbor_format() {
        let sink = MockSink::default();
        let mut scheduler =
            scheduler(StaticSource::new(DUMP), sink.clone()).with_format(Format::Cbor);

        scheduler.run_cycle().await;

        let payload: SensorPayload = decode(&sink.published()[0], Format::Cbor).unwrap();
        assert_eq!(payload.len(), 8);
    }

    #[tokio::test]
    async fn test_snapshot_failure_skips_cycle() {
        let sink = MockSink::default();
        let source = FlakySource {
            text: DUMP.to_string(),
            failures: 1,
            reads: Arc::default(),
        };
        let mut scheduler = scheduler(source, sink.clone());

        let outcome = scheduler.run_cycle().await;
        assert!(matches!(
            outcome,
            CycleOutcome::Skipped(PipelineError::Snapshot(SnapshotError::Empty))
        ));
        assert!(sink.published().is_empty());

        assert!(matches!(scheduler.run_cycle().await, CycleOutcome::Published { .. }));
        assert_eq!(scheduler.stats().skipped, 1);
        assert_eq!(scheduler.stats().cycles(), 2);
    }

    #[tokio::test]
    async fn test_malformed_snapshot_skips_cycle() {
        let mut scheduler = scheduler(
            StaticSource::new("<sys><id>SCPUCK</id></sys>"),
            MockSink::default(),
        );

        let outcome = scheduler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Skipped(PipelineError::Parse(_))));
    }

    #[tokio::test]
    async fn test_empty_group_is_left_out_of_payload() {
        let dump = "<sys><id>SCC-1-1</id><value>3200</value></sys>\
                    <sys><id>SCPU1UTI</id><value>n/a</value></sys>";
        let sink = MockSink::default();
        let mut scheduler = scheduler(StaticSource::new(dump), sink.clone());

        let outcome = scheduler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Published { sensors: 2 }));

        let payload: SensorPayload = decode(&sink.published()[0], Format::Json).unwrap();
        assert_eq!(
            ids(&payload),
            vec!["[sys][cpu]_clock_core_max", "[sys][cpu]_clock_core_min"]
        );
    }

    #[tokio::test]
    async fn test_publish_failure_is_counted() {
        let mut scheduler = scheduler(StaticSource::new(DUMP), MockSink::refusing());

        let outcome = scheduler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::PublishFailed(BridgeError::NotConnected)));
        assert_eq!(scheduler.stats().publish.failed, 1);
    }

    async fn run_for<S>(
        mut scheduler: PublishScheduler<S, MockSink>,
        duration: Duration,
    ) -> (PublishScheduler<S, MockSink>, Result<(), SchedulerError>)
    where
        S: SnapshotSource + 'static,
    {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let result = scheduler.run(rx).await;
            (scheduler, result)
        });

        tokio::time::sleep(duration).await;
        tx.send_replace(true);

        handle.await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_publishes_every_interval() {
        let sink = MockSink::default();
        let scheduler = scheduler(StaticSource::new(DUMP), sink.clone());

        let (scheduler, result) = run_for(scheduler, Duration::from_millis(6100)).await;

        assert!(result.is_ok());
        assert_eq!(sink.published().len(), 3);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(sink.disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failures_do_not_stop_loop() {
        let scheduler = scheduler(StaticSource::new(DUMP), MockSink::refusing());

        let (scheduler, result) = run_for(scheduler, Duration::from_millis(6100)).await;

        assert!(result.is_ok());
        assert_eq!(scheduler.stats().publish.failed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_retries_until_snapshot_is_available() {
        let sink = MockSink::default();
        let reads = Arc::new(AtomicUsize::new(0));
        let source = FlakySource {
            text: DUMP.to_string(),
            failures: 2,
            reads: reads.clone(),
        };

        let (_, result) = run_for(scheduler(source, sink.clone()), Duration::from_millis(6100)).await;

        assert!(result.is_ok());
        // Two failed preflights, one successful preflight, one cycle
        assert_eq!(reads.load(Ordering::SeqCst), 4);
        assert_eq!(sink.published().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_group_is_fatal() {
        let sink = MockSink::default();
        let dump = "<sys><id>SCC-1-1</id><value>3200</value></sys>";
        let mut scheduler = scheduler(StaticSource::new(dump), sink.clone());

        let (_tx, rx) = watch::channel(false);
        let result = scheduler.run(rx).await;

        match result {
            Err(SchedulerError::Configuration(ClassifierError::UnmatchedGroups(patterns))) => {
                assert_eq!(patterns, vec!["SCPU[0-9]+UTI".to_string()]);
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(!scheduler.sink().connected());
        assert!(sink.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_wait_is_prompt() {
        let sink = MockSink::default();
        let mut scheduler = scheduler(StaticSource::new(DUMP), sink.clone())
            .with_interval(Duration::from_secs(3600));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        let started = tokio::time::Instant::now();
        tx.send_replace(true);

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "scheduler did not stop promptly");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(sink.published().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_publish_completes_cycle() {
        let sink = MockSink::slow(Duration::from_millis(500));
        let mut scheduler = scheduler(StaticSource::new(DUMP), sink.clone());

        let (tx, rx) = watch::channel(false);
        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(async move {
            let result = scheduler.run(rx).await;
            (scheduler, result)
        });

        // First publish is in flight until 500ms
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send_replace(true);

        let (scheduler, result) = handle.await.unwrap();

        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(scheduler.stats().publish.success, 1);
        assert_eq!(scheduler.stats().cycles(), 1);
        assert_eq!(sink.published().len(), 1);
        assert_eq!(sink.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(sink.events(), vec!["publish", "disconnect"]);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let sink = MockSink::default();
        let mut scheduler = scheduler(StaticSource::new(DUMP), sink.clone());

        let (_tx, rx) = watch::channel(true);
        assert!(scheduler.run(rx).await.is_ok());

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(sink.published().is_empty());
    }

    #[test]
    fn test_initial_state() {
        let scheduler = scheduler(StaticSource::new(DUMP), MockSink::default());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.stats(), CycleStats::default());
    }
}
