// src/logging.rs

//! Logging setup for `devlaunch` using `tracing` + `tracing-subscriber`.
//!
//! Which filter wins:
//! 1. `--log-level` CLI flag (if provided), applied to every target
//! 2. `DEVLAUNCH_LOG`, a full `EnvFilter` directive such as
//!    `"info,app=warn"` to quiet application output
//! 3. `info`
//!
//! Build reports (target `build`) and application output (target `app`) go
//! through the same subscriber, all on STDERR.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "DEVLAUNCH_LOG";

/// Initialise the global logging subscriber.
///
/// Call once at startup; a second call fails because the global
/// subscriber is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(Level::from(lvl).as_str()),
        None => EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("initialising logging")?;

    Ok(())
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
