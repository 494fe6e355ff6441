//! Sensors: stateless readers of kernel-exposed sources.
//!
//! Every sensor implements [`Sensor`](crate::core::Sensor). Parsing lives in
//! plain functions next to each sensor so it can be exercised without touching
//! the host's `/proc`.

pub mod cpu;
pub mod disk;
pub mod load_average;
pub mod memory;
pub mod network;

use crate::config::Config;
use crate::core::{Reading, Sensor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub use cpu::CpuSensor;
pub use disk::DiskSensor;
pub use load_average::LoadAverageSensor;
pub use memory::MemorySensor;
pub use network::NetworkSensor;

/// Why a sensor could not produce (all of) its readings.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected {origin} format: {detail}")]
    Format { origin: &'static str, detail: String },

    #[error("invalid number {value:?} in {origin}")]
    InvalidNumber { origin: &'static str, value: String },

    #[error("unknown unit {0:?}")]
    UnknownUnit(String),

    #[error("{origin} reports a zero total")]
    ZeroTotal { origin: &'static str },

    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },
}

impl SensorError {
    /// True for malformed source content, as opposed to a missing or
    /// unreadable source.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            SensorError::Format { .. }
                | SensorError::InvalidNumber { .. }
                | SensorError::UnknownUnit(_)
                | SensorError::ZeroTotal { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SensorError::NotFound { .. })
    }

    pub(crate) fn format(origin: &'static str, detail: impl Into<String>) -> Self {
        SensorError::Format {
            origin,
            detail: detail.into(),
        }
    }
}

/// A failed sample, together with whatever readings were produced before the
/// failure. Pollers forward `partial` even though the sample failed.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct SampleError {
    #[source]
    pub error: SensorError,
    pub partial: Vec<Reading>,
}

impl SampleError {
    pub fn with_partial(error: SensorError, partial: Vec<Reading>) -> Self {
        Self { error, partial }
    }
}

impl From<SensorError> for SampleError {
    fn from(error: SensorError) -> Self {
        Self {
            error,
            partial: Vec::new(),
        }
    }
}

/// Reads a whole text source such as `/proc/stat`.
pub(crate) async fn read_source(path: &Path) -> Result<String, SensorError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SensorError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn parse_u64(origin: &'static str, value: &str) -> Result<u64, SensorError> {
    value.parse().map_err(|_| SensorError::InvalidNumber {
        origin,
        value: value.to_string(),
    })
}

/// Returns `used / total * 100`.
///
/// A zero total is an error rather than NaN, and so is `used > total`, which
/// can only come from a corrupt source.
pub(crate) fn usage_percentage(
    origin: &'static str,
    used: u64,
    total: u64,
) -> Result<f64, SensorError> {
    if total == 0 {
        return Err(SensorError::ZeroTotal { origin });
    }
    if used > total {
        return Err(SensorError::format(
            origin,
            format!("used amount {used} exceeds total {total}"),
        ));
    }
    Ok(used as f64 / total as f64 * 100.0)
}

/// Creates the sensors enabled in the configuration.
pub fn from_config(config: &Config) -> Vec<Arc<dyn Sensor>> {
    let enabled = &config.sensors;
    let mut sensors: Vec<Arc<dyn Sensor>> = Vec::new();
    if enabled.load_average {
        sensors.push(Arc::new(LoadAverageSensor::new()));
    }
    if enabled.cpu {
        sensors.push(Arc::new(CpuSensor::new()));
    }
    if enabled.memory {
        sensors.push(Arc::new(MemorySensor::new()));
    }
    if enabled.disk {
        sensors.push(Arc::new(DiskSensor::new(config.partition.clone())));
    }
    if enabled.network {
        sensors.push(Arc::new(NetworkSensor::new(config.network_interface.clone())));
    }
    sensors
}
