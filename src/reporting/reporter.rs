// src/reporting/reporter.rs
//! Reporter boundary and the in-process reporters

use crate::reporting::record::FailureRecord;
use crate::utils::errors::ReportError;
use std::sync::Arc;
use tracing::error;

/// Receives failure records from the interceptor.
///
/// Implementations must not panic: every internal failure is returned as a
/// [`ReportError`]. No ordering or deduplication is expected of them.
pub trait Reporter: Send + Sync {
    fn report(&self, record: FailureRecord) -> Result<(), ReportError>;
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report(&self, record: FailureRecord) -> Result<(), ReportError> {
        (**self).report(record)
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&self, record: FailureRecord) -> Result<(), ReportError> {
        (**self).report(record)
    }
}

/// Emits each record as a structured `error` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Fire-and-forget emit
    pub fn emit(&self, record: &FailureRecord) {
        error!(
            record_id = %record.id,
            call_site = %record.call_site,
            error_kind = %record.error_kind,
            timestamp = %record.timestamp.to_rfc3339(),
            "Watched operation failed: {}",
            record.error_summary
        );
    }
}

impl Reporter for TracingReporter {
    fn report(&self, record: FailureRecord) -> Result<(), ReportError> {
        self.emit(&record);
        Ok(())
    }
}

/// Forwards every record to each inner reporter.
///
/// All reporters are attempted even if one fails; the first error is
/// returned.
#[derive(Default)]
pub struct FanoutReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for FanoutReporter {
    fn report(&self, record: FailureRecord) -> Result<(), ReportError> {
        let mut first_error = None;

        for reporter in &self.reporters {
            if let Err(e) = reporter.report(record.clone()) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
