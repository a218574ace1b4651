//! Structured logging.
//!
//! Uses the tracing crate with the fmt layer writing to stdout. The filter
//! comes from `RUST_LOG` and falls back to [`DEFAULT_FILTER`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "ws_test_server=info,tower_http=warn";

/// Install the global tracing subscriber.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
