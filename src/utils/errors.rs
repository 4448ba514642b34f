// src/utils/errors.rs
//! Error types for the interception layer
//!
//! Operation errors are never represented here: they pass through the
//! interceptor untouched. These enums cover configuration, policy
//! resolution and reporting.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for fallible crate operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors raised by policy resolution and configuration
#[derive(Debug, Error)]
pub enum WatchError {
    /// No method-level or type-level policy is attached to the call site
    #[error("no interception policy attached to {site}")]
    PolicyNotFound { site: String },

    /// A call-site identifier could not be parsed
    #[error("invalid call site '{0}': expected Type::method")]
    InvalidCallSite(String),

    /// Configuration failed to load or validate
    #[error("configuration error: {0}")]
    Config(String),

    /// A silent policy was rejected because `deny_silent` is set
    #[error("silent policy on {site}: failures would be neither reported nor rethrown")]
    SilentPolicy { site: String },

    /// Filesystem error
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for WatchError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Errors returned by a [`Reporter`](crate::reporting::Reporter)
///
/// A reporter converts every internal failure into one of these; the
/// interceptor logs them and carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    /// The fire-and-forget queue is at capacity
    #[error("report queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The reporter was shut down
    #[error("reporter closed")]
    Closed,

    /// Tracker coordinates are missing
    #[error("reporter not configured: {0}")]
    Unconfigured(String),

    /// The downstream sink rejected the record
    #[error("report rejected: {0}")]
    Rejected(String),

    /// Writing the record failed
    #[error("report write failed: {0}")]
    Write(String),
}
