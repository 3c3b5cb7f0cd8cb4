//! Bridge runner for lifecycle management.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use homestats_common::init_tracing;

use crate::BridgeArgs;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};

/// How long workers get to finish their current cycle after shutdown.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Bridge runner that manages the lifecycle of a sensor bridge.
///
/// Handles:
/// - Logging initialization
/// - Task spawning and management
/// - Graceful shutdown on Ctrl+C through a `watch` channel
///
/// Workers receive the shutdown signal through [`shutdown_signal`](Self::shutdown_signal)
/// and are expected to return once it flips to `true`. A worker that returns
/// an error triggers shutdown of the whole bridge.
///
/// # Example
///
/// ```ignore
/// use homestats_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let args = BridgeArgs::parse_with_default("mybridge.json5");
///     let config = MyBridgeConfig::load(&args.config)?;
///
///     let mut runner = BridgeRunner::new_with_args("mybridge", config, Some(&args))?;
///
///     let shutdown = runner.shutdown_signal();
///     runner.spawn_with_error("poller", async move { my_worker(shutdown).await });
///
///     runner.run().await?;
///     Ok(())
/// }
/// ```
pub struct BridgeRunner<C: BridgeConfig> {
    /// Bridge name for logging and status.
    name: String,
    /// Bridge version.
    version: String,
    /// The loaded configuration.
    config: C,
    /// Flips to `true` once shutdown begins.
    shutdown_tx: watch::Sender<bool>,
    /// Spawned tasks.
    tasks: Vec<(String, JoinHandle<std::result::Result<(), String>>)>,
    drain_timeout: Duration,
}

impl<C: BridgeConfig> BridgeRunner<C> {
    /// Create a new bridge runner with CLI args for log level override.
    pub fn new_with_args(
        name: impl Into<String>,
        config: C,
        args: Option<&BridgeArgs>,
    ) -> Result<Self> {
        let log_config = match args.and_then(|a| a.log_level.as_ref()) {
            Some(level) => config.logging().with_level(level),
            None => config.logging().clone(),
        };

        init_tracing(&log_config).map_err(|e| BridgeError::config(e.to_string()))?;

        let runner = Self::detached(name, config);
        tracing::info!(bridge = %runner.name, version = %runner.version, "Starting bridge");

        Ok(runner)
    }

    /// Create a runner without touching the global tracing subscriber.
    ///
    /// For hosts that install their own subscriber, and for tests.
    pub fn detached(name: impl Into<String>, config: C) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            shutdown_tx,
            tasks: Vec::new(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Override how long workers get to finish after shutdown.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Get the bridge name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the bridge version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// A receiver that flips to `true` when the bridge is shutting down.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Spawn a worker task.
    ///
    /// Errors are logged and request shutdown of the bridge.
    pub fn spawn_with_error<F, E>(&mut self, name: impl Into<String>, future: F)
    where
        F: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let name = name.into();
        let worker = name.clone();
        let shutdown_tx = self.shutdown_tx.clone();

        let handle = tokio::spawn(async move {
            future.await.map_err(|e| {
                tracing::error!(worker = %worker, error = %e, "Worker failed");
                shutdown_tx.send_replace(true);
                e.to_string()
            })
        });
        self.tasks.push((name, handle));
    }

    /// Run the bridge until Ctrl+C is received or a worker fails.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        })
        .await
    }

    /// Run the bridge until `stop` completes or a worker fails.
    ///
    /// This will:
    /// 1. Wait for `stop` or a worker-requested shutdown
    /// 2. Flip the shutdown signal so workers finish their current cycle
    /// 3. Wait up to the drain timeout for each worker, aborting stragglers
    /// 4. Return the first worker error, if any
    pub async fn run_until<S>(self, stop: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        tracing::info!(
            bridge = %self.name,
            tasks = self.tasks.len(),
            "Bridge running. Press Ctrl+C to stop."
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::select! {
            _ = stop => {
                tracing::info!(bridge = %self.name, "Received shutdown signal");
            }
            _ = shutdown_rx.wait_for(|stopping| *stopping) => {
                tracing::info!(bridge = %self.name, "Shutdown requested by a worker");
            }
        }

        self.shutdown_tx.send_replace(true);

        let mut first_error = None;
        for (name, mut handle) in self.tasks {
            match tokio::time::timeout(self.drain_timeout, &mut handle).await {
                Ok(Ok(Ok(()))) => tracing::debug!(worker = %name, "Worker stopped"),
                Ok(Ok(Err(message))) => {
                    first_error.get_or_insert(BridgeError::worker(format!("{}: {}", name, message)));
                }
                Ok(Err(e)) => {
                    tracing::error!(worker = %name, error = %e, "Worker panicked");
                    first_error.get_or_insert(BridgeError::worker(format!("{}: {}", name, e)));
                }
                Err(_) => {
                    tracing::warn!(worker = %name, "Worker did not stop in time, aborting");
                    handle.abort();
                }
            }
        }

        tracing::info!(bridge = %self.name, "Goodbye!");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Convenience function to run a bridge with minimal boilerplate.
///
/// Parses [`BridgeArgs`], loads the configuration, initializes logging, lets
/// `setup` spawn workers, then runs until Ctrl+C.
///
/// # Example
///
/// ```ignore
/// use homestats_bridge_framework::run_bridge;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     run_bridge::<MyBridgeConfig, _>("mybridge", "mybridge.json5", |runner| {
///         let shutdown = runner.shutdown_signal();
///         runner.spawn_with_error("poller", my_worker(shutdown));
///         Ok(())
///     })
///     .await
/// }
/// ```
pub async fn run_bridge<C, F>(
    name: &str,
    default_config: &'static str,
    setup: F,
) -> anyhow::Result<()>
where
    C: BridgeConfig,
    F: FnOnce(&mut BridgeRunner<C>) -> anyhow::Result<()>,
{
    let args = BridgeArgs::parse_with_default(default_config);
    let config = C::load(&args.config).map_err(|e| anyhow::anyhow!("{}", e))?;

    let mut runner = BridgeRunner::new_with_args(name, config, Some(&args))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    setup(&mut runner)?;

    runner.run().await.map_err(|e| anyhow::anyhow!("{}", e))
}
