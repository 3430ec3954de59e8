// ---------------------------------------------------------------------------
// Logging setup for the autopilot binary.
// ---------------------------------------------------------------------------

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Library code only emits events; installing a subscriber is left to the
/// driver process.
pub fn init() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(fmt::layer().with_target(true))
        .init();
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
