//! hostpulse - host metrics sampler
//!
//! Samples load, CPU, memory, disk and network usage and prints one JSON
//! snapshot per interval on stdout. Logs go to stderr.

use anyhow::Result;
use clap::Parser;
use hostpulse::{
    app::App, cli::Cli, config::Config, internal_metrics::logging_recorder::LoggingRecorder,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        init_tracing("info");
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    init_tracing(&config.log_level);

    info!("hostpulse starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Polling Interval: {}s", config.polling_interval_seconds);
    info!("Emit Interval: {}s", config.emit_period().as_secs());
    info!("Network Interface: {}", config.network_interface);
    info!("Partition: {}", config.partition.display());
    info!("Sensors: {:?}", config.sensors);
    info!("Log Metrics: {}", config.metrics.log_metrics);
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // The recorder must be installed before any metric handle is created.
    let mut metrics_task = None;
    if config.metrics.log_metrics {
        let (recorder, handle) = LoggingRecorder::new(
            Duration::from_secs(config.metrics.log_aggregation_seconds),
            shutdown_rx.clone(),
        );
        if let Err(e) = metrics::set_global_recorder(recorder) {
            error!("Failed to install logging recorder: {}", e);
            handle.abort();
        } else {
            metrics_task = Some(handle);
        }
    }

    let app = match App::builder(config).build(shutdown_rx) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {:#}", e);
            std::process::exit(1);
        }
    };

    tokio::spawn(async move {
        wait_for_termination().await;
        info!("Shutdown signal received. Shutting down gracefully...");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = app.run().await {
        error!("hostpulse terminated: {:#}", e);
        std::process::exit(1);
    }

    if let Some(handle) = metrics_task {
        if let Err(e) = handle.await {
            error!("Metrics task panicked: {:?}", e);
        }
    }

    info!("Exiting.");
    Ok(())
}
