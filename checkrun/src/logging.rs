//! Development-time tracing for debugging runs.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. It is separate
//! from product output: diagnostics and the run epilogue are printed to
//! stdout regardless of the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format. Call once per process; a second call
/// panics because the global subscriber is already set.
///
/// # Example
/// ```bash
/// RUST_LOG=checkrun=debug checkrun run src
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
