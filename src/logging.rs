//! Logging setup for applications built on the combinators.
//!
//! The combinators only emit `tracing` events. Installing a subscriber is up
//! to the application; [`init`] provides the default one, filtered by
//! `RUST_LOG` and falling back to `info`.
//!
//! ```no_run
//! relay::logging::init();
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Install a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Fails when a global subscriber is already installed.
pub fn try_init() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Install the default subscriber unless one is already installed
pub fn init() {
    if let Err(err) = try_init() {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}
