//! Subscriber setup shared by the server and the command-line tools.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const SERVER_DIRECTIVES: &str = "info,hyper=warn,axum::rejection=trace";

/// Installs a compact stderr subscriber filtered by `RUST_LOG`, or by
/// `fallback` when that is unset. Calls after the first are no-ops.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    // Already installed (tests, or a second call): keep the first one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
