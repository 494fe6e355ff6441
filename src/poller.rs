//! Drives one sensor on a fixed period and feeds the aggregator.

use crate::aggregator::Aggregator;
use crate::core::Sensor;
use crate::internal_metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Samples a sensor every `period`, forever or until shutdown.
///
/// Failures are logged and never stop the loop. Readings returned alongside a
/// failure are still forwarded.
pub struct Poller {
    sensor: Arc<dyn Sensor>,
    period: Duration,
    aggregator: Arc<Aggregator>,
    metrics: Metrics,
}

impl Poller {
    pub fn new(
        sensor: Arc<dyn Sensor>,
        period: Duration,
        aggregator: Arc<Aggregator>,
        metrics: Metrics,
    ) -> Self {
        Self {
            sensor,
            period,
            aggregator,
            metrics,
        }
    }

    pub fn sensor_name(&self) -> &str {
        self.sensor.name()
    }

    /// Takes one sample and forwards its readings. Returns how many readings
    /// reached the aggregator.
    pub async fn poll_once(&self) -> usize {
        let name = self.sensor.name();
        self.metrics.increment_samples(name);

        let readings = match self.sensor.sample().await {
            Ok(readings) => readings,
            Err(e) => {
                self.metrics.increment_sample_failures(name);
                warn!(sensor = name, error = %e, partial = e.partial.len(), "Sample failed");
                e.partial
            }
        };

        let count = readings.len();
        if count > 0 {
            self.aggregator.put_all(readings);
            self.metrics.increment_readings_forwarded(name, count);
        }
        debug!(sensor = name, count, "Forwarded readings");
        count
    }

    /// Runs the polling loop. The first sample is taken immediately.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            sensor = self.sensor.name(),
            period_secs = self.period.as_secs_f64(),
            "Poller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!(sensor = self.sensor.name(), "Poller received shutdown signal.");
                    break;
                }
                _ = interval.tick() => {
                    // A sample in flight is abandoned if shutdown arrives meanwhile.
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => {
                            info!(sensor = self.sensor.name(), "Poller received shutdown signal during sample.");
                            break;
                        }
                        _ = self.poll_once() => {}
                    }
                }
            }
        }
    }
}
