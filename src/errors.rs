// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::time::Duration;

use thiserror::Error;

use crate::types::WatcherRole;

#[derive(Error, Debug)]
pub enum DevlaunchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{role} watcher failed before it became ready: {reason}")]
    WatcherSetup { role: WatcherRole, reason: String },

    #[error("{role} watcher stopped: {reason}")]
    WatcherCrashed { role: WatcherRole, reason: String },

    #[error("failed to launch application: {0}")]
    Launch(String),

    #[error("replacement for application process {old_pid} was not running within {window:?}")]
    RestartStalled { old_pid: u32, window: Duration },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DevlaunchError>;
