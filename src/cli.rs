// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::types::parse_duration;

/// Command-line arguments for `devlaunch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devlaunch",
    version,
    about = "Run the renderer and main build watchers and keep the app restarted on main rebuilds.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Commands and paths in it are resolved against its directory.
    #[arg(long, value_name = "PATH", default_value = "DevLaunch.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVLAUNCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `[session].restart_window`, e.g. `5s` or `1500ms`.
    #[arg(long, value_name = "DURATION", value_parser = parse_restart_window)]
    pub restart_window: Option<Duration>,

    /// Parse + validate, print the resolved watchers and launch command,
    /// but don't start anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_restart_window(s: &str) -> Result<Duration, String> {
    let dur = parse_duration(s)?;
    if dur.is_zero() {
        return Err("restart window must be greater than zero".to_string());
    }
    Ok(dur)
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
