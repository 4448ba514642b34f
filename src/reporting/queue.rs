// src/reporting/queue.rs
//! Fire-and-forget reporting
//!
//! Records are pushed onto a bounded channel and forwarded to the inner
//! reporter by a background thread, so the interceptor never waits on a
//! slow sink. A full queue drops the record and says so.

use crate::reporting::record::FailureRecord;
use crate::reporting::reporter::Reporter;
use crate::utils::errors::ReportError;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Counters {
    pushed: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Queue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pushed: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub failed: u64,
    pub capacity: usize,
}

impl QueueStats {
    /// Records accepted but not yet handled by the worker
    pub fn in_flight(&self) -> u64 {
        self.pushed
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }
}

/// Reporter that hands records to a background worker
pub struct QueuedReporter {
    sender: RwLock<Option<Sender<FailureRecord>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
    capacity: usize,
}

impl QueuedReporter {
    /// Spawn the worker thread forwarding to `inner`.
    ///
    /// A zero capacity is bumped to one; a rendezvous channel would make
    /// every report wait for the worker.
    pub fn spawn<R>(inner: R, capacity: usize) -> Self
    where
        R: Reporter + 'static,
    {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded::<FailureRecord>(capacity);
        let counters = Arc::new(Counters::default());

        let worker_counters = Arc::clone(&counters);
        let handle = std::thread::Builder::new()
            .name("issue-reporter-queue".to_string())
            .spawn(move || {
                for record in receiver.iter() {
                    let id = record.id;
                    match inner.report(record) {
                        Ok(()) => {
                            worker_counters.delivered.fetch_add(1, Ordering::Relaxed);
                            debug!(record_id = %id, "Queued report delivered");
                        }
                        Err(e) => {
                            worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                            warn!(record_id = %id, "Queued report failed: {}", e);
                        }
                    }
                }
                debug!("Report queue drained, worker exiting");
            });

        let worker = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to spawn report worker: {}", e);
                None
            }
        };

        info!("Report queue started with capacity {}", capacity);

        Self {
            sender: RwLock::new(worker.as_ref().map(|_| sender)),
            worker: Mutex::new(worker),
            counters,
            capacity,
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.counters.pushed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            capacity: self.capacity,
        }
    }

    /// Stop accepting records, drain what is queued and join the worker
    pub fn shutdown(&self) {
        self.sender.write().take();

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("Report worker panicked during shutdown");
            }
            info!("Report queue shut down");
        }
    }
}

impl Reporter for QueuedReporter {
    fn report(&self, record: FailureRecord) -> Result<(), ReportError> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(ReportError::Closed)?;

        match sender.try_send(record) {
            Ok(()) => {
                self.counters.pushed.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                Err(ReportError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => Err(ReportError::Closed),
        }
    }
}

impl Drop for QueuedReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::policy::CallSite;
    use crossbeam_channel::Receiver;
    use std::time::Duration;

    #[derive(Default)]
    struct Collecting {
        seen: Mutex<Vec<FailureRecord>>,
    }

    impl Reporter for Collecting {
        fn report(&self, record: FailureRecord) -> Result<(), ReportError> {
            self.seen.lock().push(record);
            Ok(())
        }
    }

    /// Blocks each report until the test releases it
    struct Gated {
        gate: Receiver<()>,
    }

    impl Reporter for Gated {
        fn report(&self, _record: FailureRecord) -> Result<(), ReportError> {
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            Ok(())
        }
    }

    fn record(msg: &str) -> FailureRecord {
        FailureRecord::capture(&CallSite::new("Queue", "push"), &msg)
    }

    #[test]
    fn test_records_delivered_on_shutdown() {
        let inner = Arc::new(Collecting::default());
        let queue = QueuedReporter::spawn(Arc::clone(&inner), 16);

        for i in 0..5 {
            queue.report(record(&format!("failure {}", i))).unwrap();
        }
        queue.shutdown();

        let stats = queue.stats();
        assert_eq!(stats.pushed, 5);
        assert_eq!(stats.delivered, 5);
        assert_eq!(stats.in_flight(), 0);
        assert_eq!(inner.seen.lock().len(), 5);
    }

    #[test]
    fn test_report_after_shutdown_is_closed() {
        let queue = QueuedReporter::spawn(Collecting::default(), 4);
        queue.shutdown();

        assert_eq!(queue.report(record("late")), Err(ReportError::Closed));
    }

    #[test]
    fn test_full_queue_drops() {
        let (release, gate) = crossbeam_channel::unbounded();
        let queue = QueuedReporter::spawn(Gated { gate }, 1);

        // The worker may already hold one record, so at most two fit.
        let results: Vec<_> = (0..4).map(|i| queue.report(record(&i.to_string()))).collect();
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ReportError::QueueFull { capacity: 1 }))));
        assert!(queue.stats().dropped >= 1);

        for _ in 0..4 {
            let _ = release.send(());
        }
        queue.shutdown();
    }
}
