//! Logging through `tracing`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set: debug logs from raisin and request traces.
pub const DEFAULT_FILTER: &str = "raisin=debug,tower_http=debug";

/// Install a formatting subscriber filtered by `RUST_LOG`, or by [DEFAULT_FILTER] if it is unset
/// or invalid.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
