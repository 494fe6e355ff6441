//! Latest-value store shared by every poller and the emitter.

use crate::core::Reading;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Holds the most recent [`Reading`] for each name.
///
/// All access goes through one mutex. The lock is never held across an
/// `.await`, so a plain `std::sync::Mutex` is enough and writers never wait on
/// anything slower than a map insert.
#[derive(Debug, Default)]
pub struct Aggregator {
    readings: Mutex<HashMap<String, Reading>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Reading>> {
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Upserts a reading by name. The last write for a name wins.
    pub fn put(&self, reading: Reading) {
        self.lock().insert(reading.name.clone(), reading);
    }

    /// Upserts a batch of readings under a single critical section.
    pub fn put_all(&self, readings: impl IntoIterator<Item = Reading>) {
        let mut map = self.lock();
        for reading in readings {
            map.insert(reading.name.clone(), reading);
        }
    }

    /// Returns a copy of every current reading, taken at one instant.
    /// The order is unspecified.
    pub fn snapshot_all(&self) -> Vec<Reading> {
        self.lock().values().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<Reading> {
        self.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
