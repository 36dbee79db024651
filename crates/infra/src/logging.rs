//! Logging setup
//!
//! Installs a `tracing` fmt subscriber writing to stderr, since stdio
//! transports own stdout. `RUST_LOG` takes precedence over the configured
//! level. Installation is best-effort: when the host application already set
//! a global subscriber, that one is kept.

use agnost_domain::LogLevel;
use tracing_subscriber::EnvFilter;

/// Crates whose events the default filter lets through.
const SDK_TARGETS: &[&str] = &["agnost", "agnost_core", "agnost_infra"];

/// Filter directives for `level`, scoped to the SDK crates.
pub fn default_directives(level: LogLevel) -> String {
    SDK_TARGETS
        .iter()
        .map(|target| format!("{target}={}", level.as_filter()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Returns false when one was already set.
pub fn init(level: LogLevel) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
