// src/lib.rs
//! Issue Reporter
//!
//! Wraps fallible calls and routes their failures: each call site carries
//! a policy saying whether a failure is reported (to a log, a journal, an
//! issue tracker) and whether it is rethrown to the caller or replaced by
//! a fallback value.
//!
//! # Modules
//!
//! - **interception**: policies, resolution, and the call interceptor
//! - **reporting**: failure records and the reporters that receive them
//! - **observability**: tracing subscriber setup
//! - **utils**: errors and configuration
//!
//! # Example
//!
//! ```
//! use issue_reporter::{CallInterceptor, CallSite, InterceptionPolicy, Outcome, PolicyRegistry, TracingReporter};
//!
//! let registry = PolicyRegistry::new()
//!     .bind_type("Inventory", InterceptionPolicy::report_and_suppress());
//! let interceptor = CallInterceptor::new(registry, TracingReporter::new());
//!
//! let watch = interceptor.watch(CallSite::new("Inventory", "count")).unwrap();
//! let outcome = watch.run(|| "x".parse::<u32>());
//! assert_eq!(outcome.unwrap(), Outcome::Fallback(0));
//! ```

pub mod interception;
pub mod observability;
pub mod reporting;
pub mod utils;

// Re-export commonly used types
pub use interception::{CallInterceptor, CallSite, InterceptionPolicy, Outcome, PolicyRegistry, Watch};
pub use reporting::{FailureRecord, FanoutReporter, Reporter, TracingReporter};
pub use utils::config::WatchConfig;
pub use utils::errors::{ReportError, Result, WatchError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
