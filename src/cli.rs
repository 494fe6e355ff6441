//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `hostpulse.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Periodically samples host load, CPU, memory, disk and network usage and
/// prints a JSON snapshot per interval.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Polling and emission interval in seconds.
    #[arg(short = 'i', long = "interval", value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Network interface reported by the network sensor.
    #[arg(short = 'n', long, value_name = "INTERFACE")]
    pub interface: Option<String>,

    /// Path whose filesystem is reported by the disk sensor.
    #[arg(short = 'p', long, value_name = "PATH")]
    pub partition: Option<PathBuf>,

    /// Emission interval in seconds, if different from the polling interval.
    #[arg(long, value_name = "SECONDS")]
    pub emit_interval: Option<u64>,

    /// Log filter, e.g. "debug" or "hostpulse=trace".
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(interval) = self.interval {
            dict.insert("polling_interval_seconds".into(), Value::from(interval));
        }

        if let Some(interval) = self.emit_interval {
            dict.insert("emit_interval_seconds".into(), Value::from(interval));
        }

        if let Some(interface) = &self.interface {
            dict.insert("network_interface".into(), Value::from(interface.clone()));
        }

        if let Some(partition) = &self.partition {
            dict.insert(
                "partition".into(),
                Value::from(partition.to_string_lossy().into_owned()),
            );
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
