//! Diagnostic tracing for gate runs.
//!
//! Gate progress and the verdict are product output on stdout. Tracing is
//! developer diagnostics only: subprocess spawns, timeouts, skipped files.
//! It goes to stderr so it never interleaves with what a calling CI job parses.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the env filter, falling back to [`DEFAULT_DIRECTIVE`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber.
///
/// ```bash
/// RUST_LOG=quality_gates=debug quality-gates ./sandbox
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();
}
