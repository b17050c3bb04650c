//! Diagnostics go to stderr so stdout carries only the printed outcome.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. `RUST_LOG` overrides `DEFAULT_FILTER`.
/// Calling this twice is harmless; the second call is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
