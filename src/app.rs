//! The main application logic, decoupled from the entry point.

use crate::{
    aggregator::Aggregator,
    config::Config,
    core::{Output, Sensor},
    emitter::{Emitter, EmitterError},
    internal_metrics::Metrics,
    outputs::StdoutOutput,
    poller::Poller,
    sensors,
    task_manager::TaskManager,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};

/// A handle to the running application, containing all its task handles.
pub struct App {
    task_manager: TaskManager,
    aggregator: Arc<Aggregator>,
    fatal_tx: mpsc::Sender<EmitterError>,
    fatal_rx: mpsc::Receiver<EmitterError>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The store every poller writes to.
    pub fn aggregator(&self) -> Arc<Aggregator> {
        self.aggregator.clone()
    }

    /// Sender for errors that stop the whole application. The emitter reports
    /// serialization failures through it.
    pub fn fatal_sender(&self) -> mpsc::Sender<EmitterError> {
        self.fatal_tx.clone()
    }

    /// Runs until the shutdown signal or a fatal emitter error.
    ///
    /// On shutdown every task is awaited and `Ok` is returned. A fatal error
    /// aborts the remaining tasks and is returned to the caller.
    pub async fn run(self) -> Result<()> {
        let App {
            task_manager,
            mut fatal_rx,
            ..
        } = self;
        let mut shutdown_rx = task_manager.get_shutdown_rx();

        tokio::select! {
            _ = shutdown_rx.changed() => {
                info!("Shutdown signal received. Waiting for tasks to complete...");
                task_manager.shutdown().await;
                info!("All tasks shut down.");
                Ok(())
            }
            Some(e) = fatal_rx.recv() => {
                error!(error = %e, "Fatal error, stopping all tasks.");
                task_manager.abort_all().await;
                Err(e.into())
            }
        }
    }
}

/// Builder for the main application.
///
/// Separates constructing the pipeline from running it, and lets tests swap
/// in their own sensors, output or aggregator.
pub struct AppBuilder {
    config: Config,
    sensors_override: Option<Vec<Arc<dyn Sensor>>>,
    output_override: Option<Arc<dyn Output>>,
    aggregator_override: Option<Arc<Aggregator>>,
    metrics_override: Option<Metrics>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sensors_override: None,
            output_override: None,
            aggregator_override: None,
            metrics_override: None,
        }
    }

    /// Replaces the sensors built from the configuration.
    pub fn sensors_override(mut self, sensors: Vec<Arc<dyn Sensor>>) -> Self {
        self.sensors_override = Some(sensors);
        self
    }

    /// Replaces the stdout output.
    pub fn output_override(mut self, output: Arc<dyn Output>) -> Self {
        self.output_override = Some(output);
        self
    }

    /// Uses an existing aggregator instead of a fresh one.
    pub fn aggregator_override(mut self, aggregator: Arc<Aggregator>) -> Self {
        self.aggregator_override = Some(aggregator);
        self
    }

    /// Overrides the metrics system for testing.
    pub fn metrics_override(mut self, metrics: Metrics) -> Self {
        self.metrics_override = Some(metrics);
        self
    }

    /// Spawns one poller per sensor and the emitter, returning a runnable `App`.
    #[instrument(skip_all)]
    pub fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        config.validate()?;
        let task_manager = TaskManager::new(shutdown_rx);

        let metrics = self.metrics_override.unwrap_or_default();
        let aggregator = self.aggregator_override.unwrap_or_default();
        let sensors = self
            .sensors_override
            .unwrap_or_else(|| sensors::from_config(&config));
        let output: Arc<dyn Output> = self
            .output_override
            .unwrap_or_else(|| Arc::new(StdoutOutput::new()));

        if sensors.is_empty() {
            warn!("No sensors enabled. Snapshots will be empty.");
        }

        // =========================================================================
        // 1. Pollers
        // =========================================================================
        let polling_period = config.polling_period();
        for sensor in sensors {
            let poller = Poller::new(sensor, polling_period, aggregator.clone(), metrics.clone());
            let name = format!("Poller-{}", poller.sensor_name());
            debug!(task = %name, "Starting poller");
            task_manager.spawn(name, poller.run(task_manager.get_shutdown_rx()));
        }

        // =========================================================================
        // 2. Emitter
        // =========================================================================
        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        let emitter = Emitter::new(
            aggregator.clone(),
            output,
            config.emit_period(),
            metrics,
        );
        let emitter_shutdown_rx = task_manager.get_shutdown_rx();
        let emitter_fatal_tx = fatal_tx.clone();
        task_manager.spawn("Emitter", async move {
            if let Err(e) = emitter.run(emitter_shutdown_rx).await {
                error!(error = %e, "Emitter failed");
                let _ = emitter_fatal_tx.send(e).await;
            }
        });

        info!("hostpulse initialized successfully. Sampling...");

        Ok(App {
            task_manager,
            aggregator,
            fatal_tx,
            fatal_rx,
        })
    }
}
