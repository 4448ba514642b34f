// src/interception/mod.rs
//! Call interception layer
//!
//! - **Policy**: `{rethrow, report}` flags, call sites, and resolution
//!   (method-level shadows type-level)
//! - **Call Interceptor**: runs the wrapped operation once and routes its
//!   failure
//!
//! # Flow
//!
//! ```text
//! caller ─▶ CallInterceptor::watch(site)
//!               │
//!               ├─ PolicyRegistry::resolve ──✗──▶ PolicyNotFound (operation never runs)
//!               │
//!               └─ Watch::run(operation)
//!                     ├─ Ok(v)  ───────────────▶ Outcome::Completed(v)
//!                     └─ Err(e) ─▶ report?  ─▶ Reporter::report(record)
//!                                 rethrow? ─▶ Err(e)
//!                                 else     ─▶ Outcome::Fallback(default)
//! ```

pub mod call_interceptor;
pub mod policy;

// Re-export commonly used types
pub use call_interceptor::{CallInterceptor, Outcome, Watch};
pub use policy::{resolve, BindingLevel, CallSite, InterceptionPolicy, PolicyLint, PolicyRegistry};
