//! Tracing subscriber setup shared by festsync binaries

use crate::{Error, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. "info" or
/// "fest_sync=debug") is used as the filter directive.
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", default_level, e)))?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Internal(format!("Tracing already initialized: {}", e)))
}
