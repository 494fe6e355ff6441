//! A metrics recorder that periodically logs all captured metrics.

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A metrics recorder that periodically logs all captured metrics with
/// `tracing::info!`.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    /// Creates a new `LoggingRecorder` and starts a background task to log metrics.
    ///
    /// # Arguments
    /// * `aggregation_interval` - The interval at which to log the metrics.
    /// * `shutdown_rx` - Stops the logging task once it changes.
    pub fn new(
        aggregation_interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        let recorder = Self {
            registry: registry.clone(),
        };

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + aggregation_interval;
            let mut ticker = tokio::time::interval_at(start, aggregation_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("Metrics logging task received shutdown signal.");
                        break;
                    }
                    _ = ticker.tick() => {
                        tracing::debug!("--- Metrics Snapshot ---");
                        for line in render_lines(&registry) {
                            tracing::info!("{}", line);
                        }
                    }
                }
            }
        });

        (recorder, handle)
    }
}

fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}=\"{}\"", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

/// Formats every counter and gauge as `name{labels} value`, sorted by key.
fn render_lines(registry: &Registry<Key, AtomicStorage>) -> Vec<String> {
    let mut lines: Vec<String> = registry
        .get_counter_handles()
        .into_iter()
        .map(|(key, counter)| {
            format!("[Counter] {} {}", key_to_string(&key), counter.load(Ordering::Relaxed))
        })
        .collect();
    lines.extend(registry.get_gauge_handles().into_iter().map(|(key, gauge)| {
        let value = f64::from_bits(gauge.load(Ordering::Relaxed));
        format!("[Gauge] {} {}", key_to_string(&key), value)
    }));
    // Histograms are not logged.
    lines.sort();
    lines
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry
            .get_or_create_counter(key, |c| Counter::from_arc(c.clone()))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry
            .get_or_create_gauge(key, |g| Gauge::from_arc(g.clone()))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry
            .get_or_create_histogram(key, |h| Histogram::from_arc(h.clone()))
    }
}
