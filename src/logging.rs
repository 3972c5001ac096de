//! Tracing initialization for the daemon binary.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! whole process.

use tracing_subscriber::EnvFilter;

use crate::error::{Result, SeismoError};

/// Initialize the global tracing subscriber.
pub fn init(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| SeismoError::Configuration(format!("invalid log level: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| SeismoError::Configuration(format!("failed to init tracing: {e}")))?;
    Ok(())
}
