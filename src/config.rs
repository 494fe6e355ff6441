//! Configuration management for hostpulse
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, a `hostpulse.toml` file,
//! `HOSTPULSE_` environment variables and command-line flags, in that order.

use crate::cli::Cli;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration file read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "hostpulse.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging filter for the application.
    pub log_level: String,
    /// Period of every poller, and of the emitter unless overridden.
    pub polling_interval_seconds: u64,
    /// Period of the emitter. Defaults to `polling_interval_seconds`.
    #[serde(default)]
    pub emit_interval_seconds: Option<u64>,
    /// Interface reported by the network sensor.
    pub network_interface: String,
    /// Path whose filesystem is reported by the disk sensor.
    pub partition: PathBuf,
    /// Which sensors run.
    pub sensors: SensorsConfig,
    /// Internal metrics settings.
    pub metrics: MetricsConfig,
}

/// Enables or disables individual sensors.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SensorsConfig {
    pub load_average: bool,
    pub cpu: bool,
    pub memory: bool,
    pub disk: bool,
    pub network: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            load_average: true,
            cpu: true,
            memory: true,
            disk: true,
            network: true,
        }
    }
}

/// Configuration for internal metrics.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Log internal counters to the console periodically.
    pub log_metrics: bool,
    /// How often the counters are logged, in seconds.
    pub log_aggregation_seconds: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            log_metrics: false,
            log_aggregation_seconds: 60,
        }
    }
}

impl Config {
    /// Loads the application configuration.
    ///
    /// An explicit `--config` path must exist; the default file is optional.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    bail!("configuration file {} not found", path.display());
                }
                path.clone()
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            // e.g. HOSTPULSE_POLLING_INTERVAL_SECONDS=5, HOSTPULSE_SENSORS__DISK=false
            .merge(Env::prefixed("HOSTPULSE_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make a timer fire continuously.
    pub fn validate(&self) -> Result<()> {
        if self.polling_interval_seconds == 0 {
            bail!("polling_interval_seconds must be greater than zero");
        }
        if self.emit_interval_seconds == Some(0) {
            bail!("emit_interval_seconds must be greater than zero");
        }
        if self.metrics.log_metrics && self.metrics.log_aggregation_seconds == 0 {
            bail!("metrics.log_aggregation_seconds must be greater than zero");
        }
        if self.sensors.network && self.network_interface.trim().is_empty() {
            bail!("network_interface must not be empty");
        }
        Ok(())
    }

    pub fn polling_period(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }

    pub fn emit_period(&self) -> Duration {
        Duration::from_secs(
            self.emit_interval_seconds
                .unwrap_or(self.polling_interval_seconds),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            polling_interval_seconds: 15,
            emit_interval_seconds: None,
            network_interface: "eth0".to_string(),
            partition: PathBuf::from("/"),
            sensors: SensorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}
