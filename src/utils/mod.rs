// src/utils/mod.rs
//! Shared utilities: errors and configuration

pub mod config;
pub mod errors;

pub use config::{BindingEntry, BindingsConfig, ReporterConfig, TrackerConfig, WatchConfig};
pub use errors::{ReportError, Result, WatchError};
