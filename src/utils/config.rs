// src/utils/config.rs
//! Configuration loading
//!
//! Layered with the `config` crate, lowest priority first:
//! 1. Built-in defaults
//! 2. `issue-reporter.toml` (or the file named by `ISSUE_REPORTER_CONFIG`)
//! 3. `ISSUE_REPORTER__*` environment variables, `__` between levels,
//!    e.g. `ISSUE_REPORTER__REPORTER__QUEUE_CAPACITY=4096`

use crate::interception::policy::InterceptionPolicy;
use crate::utils::errors::{Result, WatchError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "issue-reporter.toml";
const CONFIG_PATH_ENV: &str = "ISSUE_REPORTER_CONFIG";
const ENV_PREFIX: &str = "ISSUE_REPORTER";

/// One policy attachment.
///
/// Without `method` the policy applies to the whole type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEntry {
    #[serde(rename = "type")]
    pub declaring_type: String,

    #[serde(default)]
    pub method: Option<String>,

    pub rethrow: bool,

    pub report: bool,
}

impl BindingEntry {
    pub fn policy(&self) -> InterceptionPolicy {
        InterceptionPolicy::new(self.rethrow, self.report)
    }
}

/// Policy attachments
pub type BindingsConfig = Vec<BindingEntry>;

/// Reporter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Hand reports to a background worker instead of reporting inline
    #[serde(default = "default_queued")]
    pub queued: bool,

    /// Capacity of the fire-and-forget queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Append failures to this JSON-lines file
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            queued: default_queued(),
            queue_capacity: default_queue_capacity(),
            journal_path: None,
        }
    }
}

/// Issue-tracker coordinates
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// `owner/name`
    #[serde(default)]
    pub repo: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            repo: None,
            token: None,
            labels: default_labels(),
        }
    }
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("labels", &self.labels)
            .finish()
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Reject silent policies instead of warning about them
    #[serde(default)]
    pub deny_silent: bool,

    #[serde(default)]
    pub bindings: BindingsConfig,

    #[serde(default)]
    pub reporter: ReporterConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,
}

fn default_queued() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_labels() -> Vec<String> {
    vec!["bug".to_string()]
}

impl WatchConfig {
    /// Load from the process environment and a config file.
    ///
    /// A file named by `ISSUE_REPORTER_CONFIG` must exist; the implicit
    /// `issue-reporter.toml` is optional.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_sources(Some(Path::new(&path)), true, None),
            Err(_) => Self::from_sources(Some(Path::new(DEFAULT_CONFIG_FILE)), false, None),
        }
    }

    /// Load a file the user named explicitly; a missing file is an error
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_sources(Some(path), true, None)
    }

    /// Load from an optional file and an environment.
    ///
    /// `env` replaces the process environment when given. A missing file
    /// is an error only when `required` is set.
    pub fn from_sources(
        path: Option<&Path>,
        required: bool,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if required && !path.is_file() {
                return Err(WatchError::Config(format!(
                    "configuration file {} not found",
                    path.display()
                )));
            }
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(required));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: WatchConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document directly
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: WatchConfig = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reporter.queue_capacity == 0 {
            return Err(WatchError::Config(
                "reporter.queue_capacity must be greater than 0".to_string(),
            ));
        }

        if let Some(repo) = &self.tracker.repo {
            let valid = repo
                .split_once('/')
                .map(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
                .unwrap_or(false);
            if !valid {
                return Err(WatchError::Config(format!(
                    "tracker.repo '{}' is not owner/name",
                    repo
                )));
            }
        }

        for entry in &self.bindings {
            if entry.declaring_type.trim().is_empty() {
                return Err(WatchError::Config("binding with empty type".to_string()));
            }
        }

        Ok(())
    }
}
