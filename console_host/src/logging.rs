//! Log output for console hosts

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Builds the filter: `RUST_LOG` when set and valid, else `directive`
pub fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|err| {
            eprintln!("invalid log filter {directive:?}: {err}, using \"info\"");
            EnvFilter::new("info")
        })
}

/// Installs the global fmt subscriber
///
/// Returns false if a subscriber was already installed, in which case the
/// existing one stays in place.
pub fn init(directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(directive))
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
