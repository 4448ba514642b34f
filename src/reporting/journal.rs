// src/reporting/journal.rs
//! Append-only failure journal
//!
//! One JSON object per line, so the file can be tailed or grepped while
//! the process is running.

use crate::reporting::record::FailureRecord;
use crate::reporting::reporter::Reporter;
use crate::utils::errors::{ReportError, Result, WatchError};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reporter writing records to a JSON-lines file
pub struct JournalReporter {
    path: PathBuf,
    file: Mutex<File>,
}

impl JournalReporter {
    /// Open (or create) the journal at `path`, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WatchError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| WatchError::io(&path, e))?;

        info!("Failure journal opened at {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for JournalReporter {
    fn report(&self, record: FailureRecord) -> std::result::Result<(), ReportError> {
        let mut line = serde_json::to_vec(&record)
            .map_err(|e| ReportError::Write(format!("Serialization error: {}", e)))?;
        line.push(b'\n');

        let mut file = self.file.lock();
        file.write_all(&line)
            .and_then(|_| file.flush())
            .map_err(|e| ReportError::Write(format!("{}: {}", self.path.display(), e)))?;

        debug!(record_id = %record.id, "Failure journaled");
        Ok(())
    }
}

/// Read every record back from a journal. Blank lines are skipped.
pub fn read_journal(path: impl AsRef<Path>) -> Result<Vec<FailureRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| WatchError::io(path, e))?;

    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| WatchError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }

    Ok(records)
}
