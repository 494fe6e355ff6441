//! Periodically turns the aggregator's contents into a snapshot record.

use crate::aggregator::Aggregator;
use crate::core::{Output, Snapshot};
use crate::internal_metrics::Metrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Errors that stop the emitter. Anything here is fatal to the process.
#[derive(Error, Debug)]
pub enum EmitterError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct Emitter {
    aggregator: Arc<Aggregator>,
    output: Arc<dyn Output>,
    period: Duration,
    metrics: Metrics,
}

impl Emitter {
    pub fn new(
        aggregator: Arc<Aggregator>,
        output: Arc<dyn Output>,
        period: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            aggregator,
            output,
            period,
            metrics,
        }
    }

    /// Copies the aggregator and stamps the copy with the current UTC time.
    pub fn take_snapshot(&self) -> Snapshot {
        Snapshot::new(Utc::now().timestamp(), self.aggregator.snapshot_all())
    }

    /// Builds, serializes and writes one snapshot.
    ///
    /// A serialization failure is returned to the caller. A failing output is
    /// only logged; the next cycle tries again.
    pub async fn emit_once(&self) -> Result<Snapshot, EmitterError> {
        let snapshot = self.take_snapshot();
        let line = snapshot.to_json_line()?;

        if let Err(e) = self.output.write_line(&line).await {
            error!(output = self.output.name(), error = %e, "Failed to write snapshot");
        } else {
            self.metrics.snapshots_emitted_total.increment(1);
        }
        self.metrics
            .aggregated_readings
            .set(snapshot.readings.len() as f64);
        debug!(
            timestamp = snapshot.timestamp,
            readings = snapshot.readings.len(),
            "Emitted snapshot"
        );
        Ok(snapshot)
    }

    /// Runs the emission loop until shutdown. The first snapshot is written one
    /// full period after start.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), EmitterError> {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs_f64(), "Emitter started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Emitter received shutdown signal.");
                    break;
                }
                _ = interval.tick() => {
                    self.emit_once().await?;
                }
            }
        }
        Ok(())
    }
}
