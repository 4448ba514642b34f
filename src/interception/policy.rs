// src/interception/policy.rs
//! Interception policies and their resolution
//!
//! A policy is attached either to a single method or to its declaring
//! type. Resolution picks exactly one: the method-level policy if there
//! is one, otherwise the type-level policy. Fields are never merged.

use crate::utils::config::BindingEntry;
use crate::utils::errors::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// What to do when a watched operation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterceptionPolicy {
    /// Propagate the original error to the caller after handling it
    pub rethrow: bool,

    /// Forward a failure record to the reporter before deciding
    pub report: bool,
}

impl InterceptionPolicy {
    pub const fn new(rethrow: bool, report: bool) -> Self {
        Self { rethrow, report }
    }

    /// Report the failure, then propagate it
    pub const fn report_and_rethrow() -> Self {
        Self::new(true, true)
    }

    /// Report the failure and hand the caller a fallback value
    pub const fn report_and_suppress() -> Self {
        Self::new(false, true)
    }

    /// Propagate without reporting
    pub const fn rethrow_only() -> Self {
        Self::new(true, false)
    }

    /// Neither report nor propagate. Failures leave no trace.
    pub const fn silent() -> Self {
        Self::new(false, false)
    }

    /// True when a failure under this policy would vanish entirely
    pub const fn is_silent(&self) -> bool {
        !self.rethrow && !self.report
    }
}

/// Identifies a wrapped operation: a method and its declaring type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub method_id: String,
    pub declaring_type_id: String,
}

impl CallSite {
    pub fn new(declaring_type_id: impl Into<String>, method_id: impl Into<String>) -> Self {
        Self {
            method_id: method_id.into(),
            declaring_type_id: declaring_type_id.into(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type_id, self.method_id)
    }
}

impl FromStr for CallSite {
    type Err = WatchError;

    /// Parses `Type::method`. The type part may itself contain `::`.
    fn from_str(s: &str) -> Result<Self> {
        match s.rsplit_once("::") {
            Some((ty, method)) if !ty.is_empty() && !method.is_empty() => {
                Ok(Self::new(ty, method))
            }
            _ => Err(WatchError::InvalidCallSite(s.to_string())),
        }
    }
}

/// Pick the policy in effect for `site`.
///
/// The method-level policy, when present, is returned unchanged and fully
/// shadows the type-level one.
pub fn resolve(
    site: &CallSite,
    method_level: Option<InterceptionPolicy>,
    type_level: Option<InterceptionPolicy>,
) -> Result<InterceptionPolicy> {
    method_level
        .or(type_level)
        .ok_or_else(|| WatchError::PolicyNotFound {
            site: site.to_string(),
        })
}

/// Where a policy was attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingLevel {
    Method(CallSite),
    Type(String),
}

impl fmt::Display for BindingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(site) => write!(f, "method {}", site),
            Self::Type(ty) => write!(f, "type {}", ty),
        }
    }
}

/// A configuration finding about an attached policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyLint {
    pub binding: BindingLevel,
    pub message: String,
}

/// Immutable table of policy bindings
///
/// Built once, then only read; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    methods: HashMap<CallSite, InterceptionPolicy>,
    types: HashMap<String, InterceptionPolicy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a method-level policy, replacing any previous one for the site
    pub fn bind_method(mut self, site: CallSite, policy: InterceptionPolicy) -> Self {
        self.methods.insert(site, policy);
        self
    }

    /// Attach a type-level policy, replacing any previous one for the type
    pub fn bind_type(mut self, declaring_type_id: impl Into<String>, policy: InterceptionPolicy) -> Self {
        self.types.insert(declaring_type_id.into(), policy);
        self
    }

    /// Build a registry from configured bindings.
    ///
    /// A method or type may be bound at most once; a repeated binding is a
    /// configuration error rather than a silent override.
    ///
    /// With `deny_silent` set, a silent binding is a configuration error;
    /// otherwise it is only logged.
    pub fn from_config(bindings: &[BindingEntry], deny_silent: bool) -> Result<Self> {
        let mut registry = Self::new();

        for entry in bindings {
            match entry.method.as_deref() {
                Some(method) if method.is_empty() => {
                    return Err(WatchError::InvalidCallSite(format!("{}::", entry.declaring_type)));
                }
                Some(method) => {
                    let site = CallSite::new(entry.declaring_type.clone(), method);
                    if registry.methods.contains_key(&site) {
                        return Err(WatchError::Config(format!(
                            "duplicate binding for {}",
                            BindingLevel::Method(site)
                        )));
                    }
                    registry.methods.insert(site, entry.policy());
                }
                None => {
                    if registry.types.contains_key(&entry.declaring_type) {
                        return Err(WatchError::Config(format!(
                            "duplicate binding for {}",
                            BindingLevel::Type(entry.declaring_type.clone())
                        )));
                    }
                    registry
                        .types
                        .insert(entry.declaring_type.clone(), entry.policy());
                }
            }
        }

        let lints = registry.lint();
        if deny_silent {
            if let Some(lint) = lints.first() {
                return Err(WatchError::SilentPolicy {
                    site: lint.binding.to_string(),
                });
            }
        }
        for lint in &lints {
            warn!(binding = %lint.binding, "{}", lint.message);
        }

        debug!(
            methods = registry.methods.len(),
            types = registry.types.len(),
            "Policy registry built"
        );
        Ok(registry)
    }

    pub fn method_policy(&self, site: &CallSite) -> Option<InterceptionPolicy> {
        self.methods.get(site).copied()
    }

    pub fn type_policy(&self, declaring_type_id: &str) -> Option<InterceptionPolicy> {
        self.types.get(declaring_type_id).copied()
    }

    /// Resolve the policy in effect for `site`
    pub fn resolve(&self, site: &CallSite) -> Result<InterceptionPolicy> {
        resolve(
            site,
            self.method_policy(site),
            self.type_policy(&site.declaring_type_id),
        )
    }

    /// Report every binding whose policy would swallow failures silently.
    ///
    /// Sorted so output is stable across runs.
    pub fn lint(&self) -> Vec<PolicyLint> {
        let mut lints: Vec<PolicyLint> = self
            .methods
            .iter()
            .filter(|(_, policy)| policy.is_silent())
            .map(|(site, _)| BindingLevel::Method(site.clone()))
            .chain(
                self.types
                    .iter()
                    .filter(|(_, policy)| policy.is_silent())
                    .map(|(ty, _)| BindingLevel::Type(ty.clone())),
            )
            .map(|binding| PolicyLint {
                binding,
                message: "policy neither reports nor rethrows; failures will be swallowed"
                    .to_string(),
            })
            .collect();

        lints.sort_by_key(|lint| lint.binding.to_string());
        lints
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> CallSite {
        CallSite::new("Billing", "charge")
    }

    #[test]
    fn test_method_level_wins() {
        let method = InterceptionPolicy::new(false, true);
        let ty = InterceptionPolicy::new(true, false);

        let resolved = resolve(&site(), Some(method), Some(ty)).unwrap();
        assert_eq!(resolved, method);
    }

    #[test]
    fn test_type_level_fallback() {
        let ty = InterceptionPolicy::rethrow_only();
        let resolved = resolve(&site(), None, Some(ty)).unwrap();
        assert_eq!(resolved, ty);
    }

    #[test]
    fn test_no_policy_is_an_error() {
        let err = resolve(&site(), None, None).unwrap_err();
        assert!(matches!(err, WatchError::PolicyNotFound { ref site } if site == "Billing::charge"));
    }

    #[test]
    fn test_call_site_parse() {
        let site: CallSite = "billing::Invoice::charge".parse().unwrap();
        assert_eq!(site.declaring_type_id, "billing::Invoice");
        assert_eq!(site.method_id, "charge");
        assert_eq!(site.to_string(), "billing::Invoice::charge");

        assert!("charge".parse::<CallSite>().is_err());
        assert!("::charge".parse::<CallSite>().is_err());
        assert!("Billing::".parse::<CallSite>().is_err());
    }

    #[test]
    fn test_registry_resolution() {
        let registry = PolicyRegistry::new()
            .bind_type("Billing", InterceptionPolicy::rethrow_only())
            .bind_method(site(), InterceptionPolicy::report_and_suppress());

        assert_eq!(
            registry.resolve(&site()).unwrap(),
            InterceptionPolicy::report_and_suppress()
        );
        assert_eq!(
            registry.resolve(&CallSite::new("Billing", "refund")).unwrap(),
            InterceptionPolicy::rethrow_only()
        );
        assert!(registry.resolve(&CallSite::new("Ledger", "post")).is_err());
    }

    #[test]
    fn test_lint_flags_silent_bindings() {
        let registry = PolicyRegistry::new()
            .bind_type("Ledger", InterceptionPolicy::silent())
            .bind_method(site(), InterceptionPolicy::silent())
            .bind_type("Billing", InterceptionPolicy::report_and_rethrow());

        let lints = registry.lint();
        assert_eq!(lints.len(), 2);
        assert_eq!(lints[0].binding, BindingLevel::Method(site()));
        assert_eq!(lints[1].binding, BindingLevel::Type("Ledger".to_string()));
    }

    fn entry(ty: &str, method: Option<&str>, rethrow: bool, report: bool) -> BindingEntry {
        BindingEntry {
            declaring_type: ty.to_string(),
            method: method.map(str::to_string),
            rethrow,
            report,
        }
    }

    #[test]
    fn test_from_config() {
        let bindings = vec![
            entry("Billing", None, true, false),
            entry("Billing", Some("charge"), false, true),
        ];

        let registry = PolicyRegistry::from_config(&bindings, true).unwrap();
        assert_eq!(
            registry.resolve(&site()).unwrap(),
            InterceptionPolicy::report_and_suppress()
        );
        assert_eq!(
            registry.type_policy("Billing"),
            Some(InterceptionPolicy::rethrow_only())
        );
    }

    #[test]
    fn test_from_config_deny_silent() {
        let bindings = vec![entry("Ledger", None, false, false)];

        assert!(PolicyRegistry::from_config(&bindings, false).is_ok());

        let err = PolicyRegistry::from_config(&bindings, true).unwrap_err();
        assert!(matches!(err, WatchError::SilentPolicy { ref site } if site == "type Ledger"));
    }

    #[test]
    fn test_from_config_rejects_duplicate_method() {
        let bindings = vec![
            entry("Billing", Some("charge"), true, true),
            entry("Billing", Some("charge"), false, false),
        ];

        let err = PolicyRegistry::from_config(&bindings, false).unwrap_err();
        assert!(
            matches!(err, WatchError::Config(ref msg) if msg == "duplicate binding for method Billing::charge")
        );
    }

    #[test]
    fn test_from_config_rejects_duplicate_type() {
        let bindings = vec![
            entry("Billing", None, true, true),
            entry("Billing", Some("charge"), false, true),
            entry("Billing", None, true, false),
        ];

        let err = PolicyRegistry::from_config(&bindings, false).unwrap_err();
        assert!(matches!(err, WatchError::Config(ref msg) if msg == "duplicate binding for type Billing"));
    }

    #[test]
    fn test_from_config_rejects_empty_method() {
        let bindings = vec![entry("Billing", Some(""), true, true)];

        let err = PolicyRegistry::from_config(&bindings, false).unwrap_err();
        assert!(matches!(err, WatchError::InvalidCallSite(_)));
    }
}
