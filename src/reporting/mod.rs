// src/reporting/mod.rs
//! Failure reporting
//!
//! - **Record**: what the interceptor captures about a failure
//! - **Reporter**: the boundary trait, plus logging and fan-out reporters
//! - **Queue**: fire-and-forget hand-off to a background worker
//! - **Journal**: JSON-lines file of failures
//! - **Issue**: ticket composition for an external issue tracker
//!
//! # Architecture
//!
//! ```text
//! CallInterceptor ── FailureRecord ──▶ Reporter
//!                                        ├─ TracingReporter ─▶ log
//!                                        ├─ QueuedReporter ──▶ worker ─▶ inner Reporter
//!                                        ├─ JournalReporter ─▶ failures.jsonl
//!                                        └─ TicketReporter ──▶ IssueTracker (external)
//! ```

pub mod issue;
pub mod journal;
pub mod queue;
pub mod record;
pub mod reporter;

pub use issue::{IssueRef, IssueReport, IssueTracker, TicketReporter, TrackerCoordinates};
pub use journal::{read_journal, JournalReporter};
pub use queue::{QueueStats, QueuedReporter};
pub use record::FailureRecord;
pub use reporter::{FanoutReporter, Reporter, TracingReporter};
