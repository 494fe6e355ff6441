#![allow(dead_code)]
use async_trait::async_trait;
use hostpulse::core::{Reading, Sensor};
use hostpulse::sensors::{SampleError, SensorError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A sensor that always returns the same readings and counts its calls.
#[derive(Clone, Debug)]
pub struct StaticSensor {
    pub name: &'static str,
    pub readings: Vec<Reading>,
    pub calls: Arc<AtomicUsize>,
}

impl StaticSensor {
    pub fn new(name: &'static str, readings: Vec<Reading>) -> Self {
        Self {
            name,
            readings,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sensor for StaticSensor {
    fn name(&self) -> &str {
        self.name
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.readings.clone())
    }
}

/// A sensor that fails its first `failures` calls, returning `partial` with
/// each failure, and then reports `value` tagged with the call number.
#[derive(Clone, Debug)]
pub struct FlakySensor {
    pub failures: usize,
    pub partial: Vec<Reading>,
    pub calls: Arc<AtomicUsize>,
}

impl FlakySensor {
    pub fn new(failures: usize, partial: Vec<Reading>) -> Self {
        Self {
            failures,
            partial,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sensor for FlakySensor {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(SampleError::with_partial(
                SensorError::UnknownUnit("GB".to_string()),
                self.partial.clone(),
            ));
        }
        Ok(vec![Reading::new("flaky", call.to_string())])
    }
}

/// A sensor whose sample never completes.
#[derive(Clone, Debug)]
pub struct StuckSensor(pub &'static str);

#[async_trait]
impl Sensor for StuckSensor {
    fn name(&self) -> &str {
        self.0
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        std::future::pending().await
    }
}
