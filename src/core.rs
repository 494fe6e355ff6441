//! Core domain types and service traits for hostpulse
//!
//! This module defines the values that flow through the sampling pipeline and
//! the trait contracts that sensors and outputs implement.

use crate::sensors::SampleError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single named measurement.
///
/// The value is already formatted by the sensor that produced it. Nothing
/// downstream parses it back into a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Reading {
    /// Globally unique name, used as the aggregation key.
    pub name: String,
    /// Decimal-formatted value or a raw kernel counter.
    pub value: String,
}

impl Reading {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Builds a reading from a percentage, using six decimal places.
    pub fn percentage(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, format!("{:.6}", value))
    }
}

/// A timestamped copy of every reading held at one instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Unix epoch seconds, UTC.
    pub timestamp: i64,
    /// Order is unspecified.
    #[serde(rename = "metrics")]
    pub readings: Vec<Reading>,
}

impl Snapshot {
    pub fn new(timestamp: i64, readings: Vec<Reading>) -> Self {
        Self {
            timestamp,
            readings,
        }
    }

    /// Serializes the snapshot as a single JSON line (without the newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Reads one kernel-exposed source and turns it into readings.
///
/// Implementations keep no state between calls: every `sample` re-reads its
/// source from scratch.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// A short name used in logs and internal metrics (e.g. "cpu").
    fn name(&self) -> &str;

    /// Reads the source once.
    ///
    /// # Returns
    /// * `Ok(readings)`, possibly empty
    /// * `Err(SampleError)` carrying the failure and any readings that were
    ///   produced before it
    async fn sample(&self) -> Result<Vec<Reading>, SampleError>;
}

/// Writes serialized snapshots to a destination.
#[async_trait]
pub trait Output: Send + Sync {
    /// A unique, descriptive name for the output (e.g., "stdout").
    fn name(&self) -> &str;

    /// Writes one already-serialized snapshot record.
    async fn write_line(&self, line: &str) -> Result<()>;
}
