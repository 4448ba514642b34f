// src/reporting/issue.rs
//! Issue-tracker reporting
//!
//! Turns a failure record into an issue report and hands it to an external
//! tracker client. The client itself (authentication, HTTP, the tracker's
//! API) lives outside this crate behind [`IssueTracker`].

use crate::reporting::record::FailureRecord;
use crate::reporting::reporter::Reporter;
use crate::utils::config::TrackerConfig;
use crate::utils::errors::{ReportError, Result, WatchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

const REPO_ENV: &str = "GITHUB_REPO";
const TOKEN_ENV: &str = "GITHUB_TOKEN";
const MAX_TITLE_SUMMARY: usize = 72;

/// Where tickets are opened, and with which credentials
#[derive(Clone, PartialEq, Eq)]
pub struct TrackerCoordinates {
    owner: String,
    name: String,
    token: String,
}

impl TrackerCoordinates {
    /// `repo` must be `owner/name`
    pub fn new(repo: &str, token: impl Into<String>) -> Result<Self> {
        let (owner, name) = repo
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty() && !n.contains('/'))
            .ok_or_else(|| {
                WatchError::Config(format!("tracker repo '{}' is not owner/name", repo))
            })?;

        let token = token.into();
        if token.trim().is_empty() {
            return Err(WatchError::Config("tracker token is empty".to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            token,
        })
    }

    /// Read `GITHUB_REPO` and `GITHUB_TOKEN`; `None` if either is unset
    pub fn from_env() -> Result<Option<Self>> {
        Self::resolve_with(&TrackerConfig::default(), |key| std::env::var(key).ok())
    }

    /// Coordinates from configuration, each field falling back to the
    /// environment on its own
    pub fn resolve(config: &TrackerConfig) -> Result<Option<Self>> {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Same as [`resolve`](Self::resolve) with `lookup` standing in for the
    /// process environment
    pub fn resolve_with<F>(config: &TrackerConfig, lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let repo = config.repo.clone().or_else(|| lookup(REPO_ENV));
        let token = config.token.clone().or_else(|| lookup(TOKEN_ENV));

        match (repo, token) {
            (Some(repo), Some(token)) => Self::new(&repo, token).map(Some),
            _ => Ok(None),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn repo(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Debug for TrackerCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerCoordinates")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// A ticket ready to be filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    pub repo: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

impl IssueReport {
    pub fn compose(record: &FailureRecord, repo: impl Into<String>, labels: &[String]) -> Self {
        let summary = record.error_summary.lines().next().unwrap_or_default();
        let summary = if summary.chars().count() > MAX_TITLE_SUMMARY {
            let cut: String = summary.chars().take(MAX_TITLE_SUMMARY).collect();
            format!("{}...", cut)
        } else {
            summary.to_string()
        };

        let title = format!("Failure in {}: {}", record.call_site, summary);

        let body = format!(
            "An intercepted call failed.\n\n\
             | Field | Value |\n\
             |---|---|\n\
             | Call site | `{site}` |\n\
             | Error type | `{kind}` |\n\
             | Occurred at | {ts} |\n\
             | Record | `{id}` |\n\n\
             ```\n{summary}\n```\n",
            site = record.call_site,
            kind = record.error_kind,
            ts = record.timestamp.to_rfc3339(),
            id = record.id,
            summary = record.error_summary,
        );

        Self {
            repo: repo.into(),
            title,
            body,
            labels: labels.to_vec(),
        }
    }
}

/// Reference to an opened ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub url: String,
}

/// External issue-tracker client
pub trait IssueTracker: Send + Sync {
    fn open(
        &self,
        coordinates: &TrackerCoordinates,
        issue: &IssueReport,
    ) -> std::result::Result<IssueRef, ReportError>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for Arc<T> {
    fn open(
        &self,
        coordinates: &TrackerCoordinates,
        issue: &IssueReport,
    ) -> std::result::Result<IssueRef, ReportError> {
        (**self).open(coordinates, issue)
    }
}

/// Reporter that files a ticket per failure
pub struct TicketReporter<T> {
    tracker: T,
    coordinates: Option<TrackerCoordinates>,
    labels: Vec<String>,
}

impl<T: IssueTracker> TicketReporter<T> {
    pub fn new(tracker: T, coordinates: Option<TrackerCoordinates>) -> Self {
        if coordinates.is_none() {
            info!("Ticket reporter has no tracker coordinates; reports will be rejected");
        }
        Self {
            tracker,
            coordinates,
            labels: vec!["bug".to_string()],
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn from_config(tracker: T, config: &TrackerConfig) -> Result<Self> {
        let coordinates = TrackerCoordinates::resolve(config)?;
        Ok(Self::new(tracker, coordinates).with_labels(config.labels.clone()))
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }
}

impl<T: IssueTracker> Reporter for TicketReporter<T> {
    fn report(&self, record: FailureRecord) -> std::result::Result<(), ReportError> {
        let coordinates = self.coordinates.as_ref().ok_or_else(|| {
            ReportError::Unconfigured("tracker repo and token are not set".to_string())
        })?;

        let issue = IssueReport::compose(&record, coordinates.repo(), &self.labels);
        let opened = self.tracker.open(coordinates, &issue)?;

        debug!(
            record_id = %record.id,
            issue = opened.number,
            url = %opened.url,
            "Ticket opened"
        );
        Ok(())
    }
}
