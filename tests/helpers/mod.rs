#![allow(dead_code)]
//! Mock sensors and outputs shared by the integration tests.

pub mod mock_output;
pub mod mock_sensor;

use hostpulse::core::Reading;

/// Sorts readings by name so snapshots can be compared.
pub fn sorted(mut readings: Vec<Reading>) -> Vec<Reading> {
    readings.sort_by(|a, b| a.name.cmp(&b.name));
    readings
}
