//! # Internal Metrics Module
//!
//! Self-instrumentation of the sampling pipeline through the `metrics` facade.
//!
//! ## Components:
//!
//! - **`Metrics`**: A lightweight, cloneable handle that the pollers and the
//!   emitter use to record what they did. Without an installed recorder every
//!   call is a no-op.
//!
//! - **`LoggingRecorder`**: (Defined in `logging_recorder.rs`) A recorder that
//!   periodically logs the current value of every counter and gauge.

use metrics::{Counter, Gauge, Unit};

/// The public API for the metrics system.
#[derive(Clone)]
pub struct Metrics {
    pub snapshots_emitted_total: Counter,
    pub aggregated_readings: Gauge,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!("sensor_samples_total", Unit::Count, "Total number of samples taken, labeled by sensor.");
        metrics::describe_counter!("sensor_failures_total", Unit::Count, "Total number of samples that returned an error, labeled by sensor.");
        metrics::describe_counter!("readings_forwarded_total", Unit::Count, "Total number of readings handed to the aggregator, labeled by sensor.");
        metrics::describe_counter!("snapshots_emitted_total", Unit::Count, "Total number of snapshots written to the output.");
        metrics::describe_gauge!("aggregated_readings", Unit::Count, "Number of distinct readings held by the aggregator at the last emission.");

        Self {
            snapshots_emitted_total: metrics::counter!("snapshots_emitted_total"),
            aggregated_readings: metrics::gauge!("aggregated_readings"),
        }
    }

    pub fn increment_samples(&self, sensor: &str) {
        metrics::counter!("sensor_samples_total", "sensor" => sensor.to_string()).increment(1);
    }

    pub fn increment_sample_failures(&self, sensor: &str) {
        metrics::counter!("sensor_failures_total", "sensor" => sensor.to_string()).increment(1);
    }

    pub fn increment_readings_forwarded(&self, sensor: &str, count: usize) {
        metrics::counter!("readings_forwarded_total", "sensor" => sensor.to_string())
            .increment(count as u64);
    }
}

pub mod logging_recorder;
