// src/main.rs
//! Issue Reporter policy check
//!
//! Loads the interception configuration, builds the policy registry and
//! reports silent policies. Any call sites given after the config file are
//! resolved against the registry. Exits non-zero when the configuration is
//! missing or invalid, `deny_silent` rejects a binding, or a call site has
//! no policy.
//!
//! Usage: `issue-reporter [CONFIG_FILE [Type::method ...]]`

use anyhow::{Context, Result};
use issue_reporter::interception::{CallSite, InterceptionPolicy, PolicyLint, PolicyRegistry};
use issue_reporter::observability::init_tracing;
use issue_reporter::reporting::TrackerCoordinates;
use issue_reporter::WatchConfig;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a successful check found
#[derive(Debug)]
struct CheckReport {
    bindings: usize,
    lints: Vec<PolicyLint>,
    resolved: Vec<(CallSite, InterceptionPolicy)>,
}

fn main() -> Result<()> {
    init_tracing()?;

    info!("Issue Reporter v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let path = args.next().map(PathBuf::from);
    let sites: Vec<String> = args.collect();

    let report = run(path.as_deref(), &sites)?;

    for lint in &report.lints {
        println!("warning: {}: {}", lint.binding, lint.message);
    }
    for (site, policy) in &report.resolved {
        println!(
            "{}: rethrow={} report={}",
            site, policy.rethrow, policy.report
        );
    }
    println!(
        "{} binding(s) checked, {} warning(s)",
        report.bindings,
        report.lints.len()
    );
    Ok(())
}

/// Load configuration, build the registry and resolve `sites`.
///
/// An explicitly named config file must exist.
fn run(path: Option<&Path>, sites: &[String]) -> Result<CheckReport> {
    let config = match path {
        Some(path) => WatchConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WatchConfig::load().context("loading configuration")?,
    };
    info!("Configuration loaded: {:?}", config);

    let registry = PolicyRegistry::from_config(&config.bindings, config.deny_silent)
        .context("building policy registry")?;

    if registry.is_empty() {
        warn!("No policies attached; every watched call will fail with PolicyNotFound");
    }

    let resolved = sites
        .iter()
        .map(|raw| -> issue_reporter::Result<(CallSite, InterceptionPolicy)> {
            let site: CallSite = raw.parse()?;
            let policy = registry.resolve(&site)?;
            Ok((site, policy))
        })
        .collect::<issue_reporter::Result<Vec<_>>>()
        .context("resolving call sites")?;

    match TrackerCoordinates::resolve(&config.tracker).context("resolving tracker coordinates")? {
        Some(coords) => info!("Tickets will be filed in {}", coords.repo()),
        None => info!("No tracker coordinates configured; tickets disabled"),
    }

    Ok(CheckReport {
        bindings: config.bindings.len(),
        lints: registry.lint(),
        resolved,
    })
}
