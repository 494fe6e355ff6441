use super::{parse_u64, read_source, usage_percentage, SampleError, SensorError};
use crate::core::{Reading, Sensor};
use async_trait::async_trait;
use std::path::PathBuf;

const STAT_PATH: &str = "/proc/stat";
const ORIGIN: &str = "/proc/stat";

/// Busy percentage of every `cpu*` line in `/proc/stat`, since boot.
#[derive(Debug, Clone)]
pub struct CpuSensor {
    source: PathBuf,
}

impl CpuSensor {
    pub fn new() -> Self {
        Self::with_source(STAT_PATH)
    }

    pub fn with_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Default for CpuSensor {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative jiffies for one CPU line, limited to the fields the busy
/// percentage needs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuTimes {
    pub fn busy(&self) -> Result<u64, SensorError> {
        self.user
            .checked_add(self.nice)
            .and_then(|sum| sum.checked_add(self.system))
            .ok_or_else(|| SensorError::format(ORIGIN, "busy jiffies overflow"))
    }

    pub fn usage_percentage(&self) -> Result<f64, SensorError> {
        let busy = self.busy()?;
        let total = busy
            .checked_add(self.idle)
            .ok_or_else(|| SensorError::format(ORIGIN, "total jiffies overflow"))?;
        usage_percentage(ORIGIN, busy, total)
    }
}

fn parse_cpu_line(line: &str) -> Result<(String, CpuTimes), SensorError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return Err(SensorError::format(
            ORIGIN,
            format!("line {:?} has {} fields", parts.first().unwrap_or(&""), parts.len()),
        ));
    }
    let times = CpuTimes {
        user: parse_u64(ORIGIN, parts[1])?,
        nice: parse_u64(ORIGIN, parts[2])?,
        system: parse_u64(ORIGIN, parts[3])?,
        idle: parse_u64(ORIGIN, parts[4])?,
    };
    Ok((parts[0].to_string(), times))
}

/// Parses every `cpu*` line. A bad line does not stop the others from being
/// reported; the first failure is returned along with the good readings.
pub fn parse_stat(content: &str) -> Result<Vec<Reading>, SampleError> {
    let mut readings = Vec::new();
    let mut first_error = None;

    for line in content.lines().filter(|line| line.starts_with("cpu")) {
        let result = parse_cpu_line(line).and_then(|(name, times)| {
            times
                .usage_percentage()
                .map(|usage| Reading::percentage(name, usage))
        });
        match result {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(error) => Err(SampleError::with_partial(error, readings)),
        None => Ok(readings),
    }
}

#[async_trait]
impl Sensor for CpuSensor {
    fn name(&self) -> &str {
        "cpu"
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        let content = read_source(&self.source).await?;
        parse_stat(&content)
    }
}
