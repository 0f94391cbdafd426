//! Logging bootstrap helpers
//!
//! Thin wrappers over `tracing-subscriber` so host applications can turn on
//! structured logging with one call. Both helpers are safe to call more than
//! once; only the first initialization takes effect.

use crate::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging to stdout at the given filter level
/// (e.g. `"debug"` or `"roomlink=debug,webrtc=warn"`)
pub fn init_stdout(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| Error::InvalidConfig(format!("Invalid log filter '{}': {}", level, e)))?;

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    Ok(())
}

/// Initialize logging to a file at the given filter level
///
/// The file is created if missing and appended to otherwise.
pub fn init_file(path: impl AsRef<Path>, level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| Error::InvalidConfig(format!("Invalid log filter '{}': {}", level, e)))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .try_init();

    Ok(())
}
