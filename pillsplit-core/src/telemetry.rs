//! Logging setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Install a `RUST_LOG`-driven subscriber writing to stderr, unless one is
/// already set. `default_level` applies when `RUST_LOG` is unset.
pub fn init_tracing(default_level: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
