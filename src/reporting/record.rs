// src/reporting/record.rs
//! Failure records handed to reporters

use crate::interception::policy::CallSite;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use ulid::Ulid;

/// One failed invocation of a watched operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Unique record ID
    pub id: Ulid,

    /// Where the failure happened
    pub call_site: CallSite,

    /// Display rendering of the original error
    pub error_summary: String,

    /// Type name of the original error
    pub error_kind: String,

    /// When the failure was captured
    pub timestamp: DateTime<Utc>,
}

impl FailureRecord {
    /// Capture `error` raised at `call_site`
    pub fn capture<E: Display>(call_site: &CallSite, error: &E) -> Self {
        Self {
            id: Ulid::new(),
            call_site: call_site.clone(),
            error_summary: error.to_string(),
            error_kind: std::any::type_name::<E>().to_string(),
            timestamp: Utc::now(),
        }
    }
}
