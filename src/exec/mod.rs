// src/exec/mod.rs

//! Process execution layer.
//!
//! This module spawns and signals the application process with
//! `tokio::process::Command` and reports back to the runtime via
//! `SessionEvent`s.
//!
//! - [`launch`] resolves how the application is started from the config.
//! - [`app_process`] owns one running application process (output
//!   observers, exit reporting, SIGTERM with escalation).
//! - [`backend`] provides the `ProcessBackend` trait and the concrete
//!   `RealProcessBackend` the runtime uses in production, which tests can
//!   replace with a fake implementation.
//! - [`shell`] builds platform shell commands for watcher commands.

pub mod app_process;
pub mod backend;
pub mod launch;
pub mod shell;

pub use app_process::AppProcess;
pub use backend::{LaunchOutcome, ProcessBackend, RealProcessBackend};
pub use launch::AppLaunchSpec;
pub use shell::shell_command;
