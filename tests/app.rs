//! End-to-end tests for the assembled application.

use anyhow::Result;
use hostpulse::aggregator::Aggregator;
use hostpulse::app::App;
use hostpulse::config::Config;
use hostpulse::core::{Reading, Sensor};
use hostpulse::emitter::EmitterError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

mod helpers;
use helpers::mock_output::CapturingOutput;
use helpers::mock_sensor::{FlakySensor, StaticSensor, StuckSensor};
use helpers::sorted;

fn fast_config() -> Config {
    Config {
        polling_interval_seconds: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_app_emits_merged_snapshots() -> Result<()> {
    let output = CapturingOutput::new();
    let load = StaticSensor::new(
        "loadavg",
        vec![
            Reading::new("loadavg-1", "0.10"),
            Reading::new("loadavg-5", "0.20"),
            Reading::new("loadavg-15", "0.30"),
        ],
    );
    let memory = StaticSensor::new("memory", vec![Reading::new("memory usage", "75.000000")]);
    let sensors: Vec<Arc<dyn Sensor>> = vec![Arc::new(load), Arc::new(memory)];

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = App::builder(fast_config())
        .sensors_override(sensors)
        .output_override(Arc::new(output.clone()))
        .build(shutdown_rx)?;
    let handle = tokio::spawn(app.run());

    output.wait_for_lines(1, Duration::from_secs(5)).await;

    let snapshot = output.snapshots().remove(0);
    assert_eq!(
        sorted(snapshot.readings),
        vec![
            Reading::new("loadavg-1", "0.10"),
            Reading::new("loadavg-15", "0.30"),
            Reading::new("loadavg-5", "0.20"),
            Reading::new("memory usage", "75.000000"),
        ]
    );

    shutdown_tx.send(true)?;
    timeout(Duration::from_secs(5), handle).await???;
    Ok(())
}

#[tokio::test]
async fn test_failing_sensor_does_not_interrupt_snapshots() -> Result<()> {
    let output = CapturingOutput::new();
    let healthy = StaticSensor::new("static", vec![Reading::new("loadavg-1", "1.00")]);
    let broken = FlakySensor::new(usize::MAX, vec![]);
    let sensors: Vec<Arc<dyn Sensor>> = vec![Arc::new(healthy), Arc::new(broken.clone())];

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = App::builder(fast_config())
        .sensors_override(sensors)
        .output_override(Arc::new(output.clone()))
        .build(shutdown_rx)?;
    let handle = tokio::spawn(app.run());

    output.wait_for_lines(2, Duration::from_secs(5)).await;

    for snapshot in output.snapshots() {
        assert_eq!(snapshot.readings, vec![Reading::new("loadavg-1", "1.00")]);
    }
    assert!(broken.calls() >= 2);

    shutdown_tx.send(true)?;
    timeout(Duration::from_secs(5), handle).await???;
    Ok(())
}

#[tokio::test]
async fn test_app_shuts_down_within_timeout() -> Result<()> {
    let aggregator = Arc::new(Aggregator::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let config = Config {
        polling_interval_seconds: 3600,
        ..Default::default()
    };
    let sensor = StaticSensor::new("static", vec![Reading::new("a", "1")]);
    let app = App::builder(config)
        .sensors_override(vec![Arc::new(sensor)])
        .output_override(Arc::new(CapturingOutput::new()))
        .aggregator_override(aggregator.clone())
        .build(shutdown_rx)?;
    assert!(Arc::ptr_eq(&app.aggregator(), &aggregator));
    let handle = tokio::spawn(app.run());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(aggregator.get("a"), Some(Reading::new("a", "1")));

    shutdown_tx.send(true)?;
    timeout(Duration::from_secs(5), handle).await???;
    Ok(())
}

#[tokio::test]
async fn test_build_rejects_zero_interval() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let config = Config {
        polling_interval_seconds: 0,
        ..Default::default()
    };
    let result = App::builder(config)
        .sensors_override(vec![])
        .output_override(Arc::new(CapturingOutput::new()))
        .build(shutdown_rx);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_fatal_emitter_error_stops_the_app() -> Result<()> {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let sensors: Vec<Arc<dyn Sensor>> = vec![
        Arc::new(StaticSensor::new("static", vec![Reading::new("a", "1")])),
        Arc::new(StuckSensor("stuck")),
    ];
    let app = App::builder(fast_config())
        .sensors_override(sensors)
        .output_override(Arc::new(CapturingOutput::new()))
        .build(shutdown_rx)?;

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    app.fatal_sender().send(EmitterError::from(json_error)).await?;

    // No shutdown signal is sent, so returning at all means the tasks were aborted.
    let result = timeout(Duration::from_secs(5), app.run()).await?;
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("failed to serialize snapshot"));
    Ok(())
}
