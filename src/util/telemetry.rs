//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`. Users can install their own subscriber;
/// this helper only installs a default fmt subscriber if none is set.
pub fn init_tracing() {
    install(EnvFilter::from_default_env());
}

/// Like [`init_tracing`], but falls back to `default_directive` (for example
/// `"prometheus_background_work=debug"`) when `RUST_LOG` is unset or invalid.
pub fn init_tracing_with_default(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    install(filter);
}

fn install(filter: EnvFilter) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
