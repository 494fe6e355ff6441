//! hostpulse - a host metrics sampler
//!
//! Independent pollers sample kernel-exposed sources (load average, CPU,
//! memory, disk, network) into a shared aggregator, and an emitter writes a
//! timestamped JSON snapshot of it on a fixed cadence.

pub mod aggregator;
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod emitter;
pub mod internal_metrics;
pub mod outputs;
pub mod poller;
pub mod sensors;
pub mod task_manager;

// Re-export core types for convenience
pub use core::*;
