// src/interception/call_interceptor.rs
//! Call interceptor
//!
//! Runs a wrapped operation exactly once and routes its failure according
//! to the call site's policy: report it, then either hand the original
//! error back or substitute a fallback value.

use crate::interception::policy::{CallSite, InterceptionPolicy, PolicyRegistry};
use crate::reporting::journal::JournalReporter;
use crate::reporting::queue::QueuedReporter;
use crate::reporting::record::FailureRecord;
use crate::reporting::reporter::{FanoutReporter, Reporter, TracingReporter};
use crate::utils::config::WatchConfig;
use crate::utils::errors::Result;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a watched call that did not propagate an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation returned this value
    Completed(T),

    /// The operation failed and its error was suppressed; this is the
    /// call site's fallback value
    Fallback(T),
}

impl<T> Outcome<T> {
    /// The value, whether real or substituted
    pub fn into_inner(self) -> T {
        match self {
            Self::Completed(value) | Self::Fallback(value) => value,
        }
    }

    /// The value only if the operation actually produced it
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Fallback(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Wraps operations with failure routing.
///
/// Holds only shared immutable state, so clones are cheap and concurrent
/// invocations need no coordination.
#[derive(Clone)]
pub struct CallInterceptor {
    registry: Arc<PolicyRegistry>,
    reporter: Arc<dyn Reporter>,
}

impl CallInterceptor {
    pub fn new(registry: PolicyRegistry, reporter: impl Reporter + 'static) -> Self {
        Self::from_shared(Arc::new(registry), Arc::new(reporter))
    }

    pub fn from_shared(registry: Arc<PolicyRegistry>, reporter: Arc<dyn Reporter>) -> Self {
        Self { registry, reporter }
    }

    /// Build the registry and reporter stack described by `config`.
    ///
    /// Failures are always logged; a journal is added when configured, and
    /// `sinks` carries any further reporters (an issue tracker, say). With
    /// `reporter.queued` the whole stack sits behind a background queue.
    pub fn from_config(config: &WatchConfig, sinks: FanoutReporter) -> Result<Self> {
        let registry = PolicyRegistry::from_config(&config.bindings, config.deny_silent)?;

        let mut stack = sinks.with(TracingReporter::new());
        if let Some(path) = &config.reporter.journal_path {
            stack = stack.with(JournalReporter::open(path)?);
        }

        info!(
            reporters = stack.len(),
            queued = config.reporter.queued,
            "Interceptor configured"
        );

        let reporter: Arc<dyn Reporter> = if config.reporter.queued {
            Arc::new(QueuedReporter::spawn(stack, config.reporter.queue_capacity))
        } else {
            Arc::new(stack)
        };

        Ok(Self::from_shared(Arc::new(registry), reporter))
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Resolve the policy for `site` and return a handle to run operations
    /// under it. Fails with `PolicyNotFound` before anything runs.
    pub fn watch(&self, site: CallSite) -> Result<Watch<'_>> {
        let policy = self.registry.resolve(&site)?;
        Ok(Watch {
            interceptor: self,
            site,
            policy,
        })
    }

    /// Run `operation` under `policy`, falling back to `T::default()` when
    /// a failure is suppressed
    pub fn invoke<T, E, F>(
        &self,
        site: &CallSite,
        policy: InterceptionPolicy,
        operation: F,
    ) -> std::result::Result<Outcome<T>, E>
    where
        T: Default,
        E: Display,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.invoke_or(site, policy, operation, T::default)
    }

    /// Run `operation` under `policy` with an explicit fallback
    pub fn invoke_or<T, E, F, D>(
        &self,
        site: &CallSite,
        policy: InterceptionPolicy,
        operation: F,
        fallback: D,
    ) -> std::result::Result<Outcome<T>, E>
    where
        E: Display,
        F: FnOnce() -> std::result::Result<T, E>,
        D: FnOnce() -> T,
    {
        match operation() {
            Ok(value) => Ok(Outcome::Completed(value)),
            Err(err) => {
                self.route_failure(site, policy, err)?;
                Ok(Outcome::Fallback(fallback()))
            }
        }
    }

    /// Await `operation` under `policy`
    pub async fn invoke_async<T, E, Fut>(
        &self,
        site: &CallSite,
        policy: InterceptionPolicy,
        operation: Fut,
    ) -> std::result::Result<Outcome<T>, E>
    where
        T: Default,
        E: Display,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.invoke_async_or(site, policy, operation, T::default)
            .await
    }

    /// Await `operation` under `policy` with an explicit fallback
    pub async fn invoke_async_or<T, E, Fut, D>(
        &self,
        site: &CallSite,
        policy: InterceptionPolicy,
        operation: Fut,
        fallback: D,
    ) -> std::result::Result<Outcome<T>, E>
    where
        E: Display,
        Fut: Future<Output = std::result::Result<T, E>>,
        D: FnOnce() -> T,
    {
        match operation.await {
            Ok(value) => Ok(Outcome::Completed(value)),
            Err(err) => {
                self.route_failure(site, policy, err)?;
                Ok(Outcome::Fallback(fallback()))
            }
        }
    }

    /// Report the failure if asked to, then give the error back when it
    /// must be rethrown. A reporter failure never replaces `err`.
    fn route_failure<E: Display>(
        &self,
        site: &CallSite,
        policy: InterceptionPolicy,
        err: E,
    ) -> std::result::Result<(), E> {
        metrics::counter!("issue_reporter_failures_total").increment(1);

        if policy.report {
            let record = FailureRecord::capture(site, &err);
            let record_id = record.id;
            if let Err(report_err) = self.reporter.report(record) {
                metrics::counter!("issue_reporter_reports_failed_total").increment(1);
                warn!(
                    call_site = %site,
                    record_id = %record_id,
                    "Failed to report intercepted failure: {}",
                    report_err
                );
            }
        }

        if policy.rethrow {
            debug!(call_site = %site, "Rethrowing intercepted failure");
            Err(err)
        } else {
            metrics::counter!("issue_reporter_suppressed_total").increment(1);
            debug!(call_site = %site, "Suppressed intercepted failure: {}", err);
            Ok(())
        }
    }
}

/// A call site with its resolved policy
pub struct Watch<'a> {
    interceptor: &'a CallInterceptor,
    site: CallSite,
    policy: InterceptionPolicy,
}

impl Watch<'_> {
    pub fn site(&self) -> &CallSite {
        &self.site
    }

    pub fn policy(&self) -> InterceptionPolicy {
        self.policy
    }

    pub fn run<T, E, F>(&self, operation: F) -> std::result::Result<Outcome<T>, E>
    where
        T: Default,
        E: Display,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.interceptor.invoke(&self.site, self.policy, operation)
    }

    pub fn run_or<T, E, F, D>(&self, operation: F, fallback: D) -> std::result::Result<Outcome<T>, E>
    where
        E: Display,
        F: FnOnce() -> std::result::Result<T, E>,
        D: FnOnce() -> T,
    {
        self.interceptor
            .invoke_or(&self.site, self.policy, operation, fallback)
    }

    pub async fn run_async<T, E, Fut>(&self, operation: Fut) -> std::result::Result<Outcome<T>, E>
    where
        T: Default,
        E: Display,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.interceptor
            .invoke_async(&self.site, self.policy, operation)
            .await
    }

    pub async fn run_async_or<T, E, Fut, D>(
        &self,
        operation: Fut,
        fallback: D,
    ) -> std::result::Result<Outcome<T>, E>
    where
        E: Display,
        Fut: Future<Output = std::result::Result<T, E>>,
        D: FnOnce() -> T,
    {
        self.interceptor
            .invoke_async_or(&self.site, self.policy, operation, fallback)
            .await
    }
}
