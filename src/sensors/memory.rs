use super::{parse_u64, read_source, usage_percentage, SampleError, SensorError};
use crate::core::{Reading, Sensor};
use async_trait::async_trait;
use std::path::PathBuf;

const MEMINFO_PATH: &str = "/proc/meminfo";
const ORIGIN: &str = "/proc/meminfo";

/// Percentage of memory in use, derived from `MemTotal` and `MemAvailable`.
#[derive(Debug, Clone)]
pub struct MemorySensor {
    source: PathBuf,
}

impl MemorySensor {
    pub fn new() -> Self {
        Self::with_source(MEMINFO_PATH)
    }

    pub fn with_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Default for MemorySensor {
    fn default() -> Self {
        Self::new()
    }
}

/// Multiplier that converts a `/proc/meminfo` unit to bytes.
pub fn unit_factor(unit: &str) -> Result<u64, SensorError> {
    match unit {
        "B" => Ok(1),
        "kB" => Ok(1_000),
        "MB" => Ok(1_000_000),
        other => Err(SensorError::UnknownUnit(other.to_string())),
    }
}

/// Parses a `Key: value unit` line into bytes.
fn parse_bytes(line: &str) -> Result<u64, SensorError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(SensorError::format(
            ORIGIN,
            format!("line {line:?} has {} fields", fields.len()),
        ));
    }
    let value = parse_u64(ORIGIN, fields[1])?;
    let factor = unit_factor(fields[2])?;
    value
        .checked_mul(factor)
        .ok_or_else(|| SensorError::format(ORIGIN, format!("{} overflows", fields[1])))
}

pub fn parse_meminfo(content: &str) -> Result<Vec<Reading>, SensorError> {
    let mut total = None;
    let mut available = None;

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            total = Some(parse_bytes(line)?);
        } else if line.starts_with("MemAvailable:") {
            available = Some(parse_bytes(line)?);
        }
    }

    let total = total.ok_or_else(|| SensorError::format(ORIGIN, "missing MemTotal"))?;
    let available =
        available.ok_or_else(|| SensorError::format(ORIGIN, "missing MemAvailable"))?;
    let used = total.checked_sub(available).ok_or_else(|| {
        SensorError::format(ORIGIN, format!("MemAvailable {available} exceeds MemTotal {total}"))
    })?;

    Ok(vec![Reading::percentage(
        "memory usage",
        usage_percentage(ORIGIN, used, total)?,
    )])
}

#[async_trait]
impl Sensor for MemorySensor {
    fn name(&self) -> &str {
        "memory"
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        let content = read_source(&self.source).await?;
        Ok(parse_meminfo(&content)?)
    }
}
