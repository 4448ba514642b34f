//! Failure-routing properties over every policy flag combination

use issue_reporter::reporting::{FailureRecord, Reporter};
use issue_reporter::{
    CallInterceptor, CallSite, InterceptionPolicy, Outcome, PolicyRegistry, ReportError,
    WatchError,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpError {
    id: u32,
    message: String,
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

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

#[derive(Default)]
struct Failing {
    calls: AtomicUsize,
}

impl Reporter for Failing {
    fn report(&self, _record: FailureRecord) -> Result<(), ReportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ReportError::Rejected("tracker unavailable".to_string()))
    }
}

fn site() -> CallSite {
    CallSite::new("Warehouse", "restock")
}

fn policy_strategy() -> impl Strategy<Value = InterceptionPolicy> {
    (any::<bool>(), any::<bool>()).prop_map(|(rethrow, report)| InterceptionPolicy::new(rethrow, report))
}

proptest! {
    #[test]
    fn failure_follows_policy(policy in policy_strategy(), id in any::<u32>(), message in "[a-z ]{1,40}") {
        let reporter = Arc::new(Collecting::default());
        let interceptor = CallInterceptor::new(PolicyRegistry::new(), Arc::clone(&reporter));
        let original = OpError { id, message: message.clone() };

        let result = interceptor.invoke(&site(), policy, || Err::<u64, _>(original.clone()));

        if policy.rethrow {
            prop_assert_eq!(result, Err(original));
        } else {
            prop_assert_eq!(result, Ok(Outcome::Fallback(0)));
        }

        let seen = reporter.seen.lock();
        if policy.report {
            prop_assert_eq!(seen.len(), 1);
            prop_assert_eq!(&seen[0].error_summary, &message);
            prop_assert_eq!(&seen[0].call_site, &site());
        } else {
            prop_assert!(seen.is_empty());
        }
    }

    #[test]
    fn success_is_untouched(policy in policy_strategy(), value in any::<i32>()) {
        let reporter = Arc::new(Collecting::default());
        let interceptor = CallInterceptor::new(PolicyRegistry::new(), Arc::clone(&reporter));

        let result = interceptor.invoke(&site(), policy, || Ok::<_, OpError>(value));

        prop_assert_eq!(result, Ok(Outcome::Completed(value)));
        prop_assert!(reporter.seen.lock().is_empty());
    }

    #[test]
    fn reporter_failure_is_isolated(rethrow in any::<bool>()) {
        let reporter = Arc::new(Failing::default());
        let interceptor = CallInterceptor::new(PolicyRegistry::new(), Arc::clone(&reporter));
        let policy = InterceptionPolicy::new(rethrow, true);
        let original = OpError { id: 7, message: "disk full".to_string() };

        let result = interceptor.invoke(&site(), policy, || Err::<String, _>(original.clone()));

        prop_assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
        if rethrow {
            prop_assert_eq!(result, Err(original));
        } else {
            prop_assert_eq!(result, Ok(Outcome::Fallback(String::new())));
        }
    }

    #[test]
    fn method_policy_shadows_type_policy(method in policy_strategy(), ty in policy_strategy()) {
        let registry = PolicyRegistry::new()
            .bind_type("Warehouse", ty)
            .bind_method(site(), method);

        prop_assert_eq!(registry.resolve(&site()).unwrap(), method);
        prop_assert_eq!(registry.resolve(&CallSite::new("Warehouse", "audit")).unwrap(), ty);
    }
}

#[test]
fn disk_full_is_reported_and_rethrown() {
    let reporter = Arc::new(Collecting::default());
    let registry = PolicyRegistry::new().bind_method(site(), InterceptionPolicy::new(true, true));
    let interceptor = CallInterceptor::new(registry, Arc::clone(&reporter));

    let err = interceptor
        .watch(site())
        .unwrap()
        .run(|| {
            Err::<(), _>(OpError {
                id: 1,
                message: "disk full".to_string(),
            })
        })
        .unwrap_err();

    assert_eq!(err.id, 1);
    assert_eq!(err.message, "disk full");

    let seen = reporter.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].error_summary, "disk full");
}

#[test]
fn silent_policy_swallows_everything() {
    let reporter = Arc::new(Collecting::default());
    let registry = PolicyRegistry::new().bind_type("Warehouse", InterceptionPolicy::new(false, false));
    let interceptor = CallInterceptor::new(registry, Arc::clone(&reporter));

    let outcome = interceptor
        .watch(site())
        .unwrap()
        .run(|| {
            Err::<Vec<u8>, _>(OpError {
                id: 2,
                message: "anything".to_string(),
            })
        })
        .unwrap();

    assert_eq!(outcome, Outcome::Fallback(Vec::new()));
    assert!(reporter.seen.lock().is_empty());
    assert_eq!(interceptor.registry().lint().len(), 1);
}

#[test]
fn unbound_site_fails_before_running() {
    let interceptor = CallInterceptor::new(
        PolicyRegistry::new().bind_type("Ledger", InterceptionPolicy::rethrow_only()),
        Collecting::default(),
    );

    match interceptor.watch(site()) {
        Err(WatchError::PolicyNotFound { site }) => assert_eq!(site, "Warehouse::restock"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected PolicyNotFound"),
    }
}

#[test]
fn concurrent_invocations_share_one_interceptor() {
    let reporter = Arc::new(Collecting::default());
    let registry = PolicyRegistry::new().bind_type("Warehouse", InterceptionPolicy::report_and_suppress());
    let interceptor = CallInterceptor::new(registry, Arc::clone(&reporter));

    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let interceptor = interceptor.clone();
            std::thread::spawn(move || {
                let watch = interceptor.watch(site()).unwrap();
                (0..25u32)
                    .map(|j| {
                        watch
                            .run(|| {
                                if j % 2 == 0 {
                                    Ok(i * 100 + j)
                                } else {
                                    Err(OpError {
                                        id: j,
                                        message: format!("worker {} step {}", i, j),
                                    })
                                }
                            })
                            .unwrap()
                    })
                    .filter(Outcome::is_fallback)
                    .count()
            })
        })
        .collect();

    let fallbacks: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(fallbacks, 8 * 12);
    assert_eq!(reporter.seen.lock().len(), 8 * 12);
}
