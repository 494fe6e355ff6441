use super::{read_source, SampleError, SensorError};
use crate::core::{Reading, Sensor};
use async_trait::async_trait;
use std::path::PathBuf;

const LOADAVG_PATH: &str = "/proc/loadavg";
const ORIGIN: &str = "/proc/loadavg";

/// Reports the 1, 5 and 15 minute load averages verbatim.
#[derive(Debug, Clone)]
pub struct LoadAverageSensor {
    source: PathBuf,
}

impl LoadAverageSensor {
    pub fn new() -> Self {
        Self::with_source(LOADAVG_PATH)
    }

    /// Reads from `source` instead of `/proc/loadavg`.
    pub fn with_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Default for LoadAverageSensor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_loadavg(content: &str) -> Result<Vec<Reading>, SensorError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(SensorError::format(
            ORIGIN,
            format!("got {} fields", fields.len()),
        ));
    }
    Ok(vec![
        Reading::new("loadavg-1", fields[0]),
        Reading::new("loadavg-5", fields[1]),
        Reading::new("loadavg-15", fields[2]),
    ])
}

#[async_trait]
impl Sensor for LoadAverageSensor {
    fn name(&self) -> &str {
        "loadavg"
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        let content = read_source(&self.source).await?;
        Ok(parse_loadavg(&content)?)
    }
}
