// src/engine/mod.rs

//! Orchestration engine for devlaunch.
//!
//! This module ties together:
//! - the readiness barrier gating the first launch
//! - the process supervisor (launch / restart / exit discrimination)
//! - the main runtime event loop that reacts to:
//!   - build events from both watchers
//!   - process spawn / exit reports
//!   - the restart window timer
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Duration;

use crate::errors::{DevlaunchError, Result};
use crate::types::{BuildEvent, WatcherRole};

/// Events flowing into the runtime from watchers, processes and signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A watcher started compiling (informational).
    BuildStarted { role: WatcherRole },
    /// A watcher finished a compile.
    Build { role: WatcherRole, event: BuildEvent },
    /// The renderer's serving layer can serve the current output.
    ServingReady,
    /// A watcher stopped or could not start.
    WatcherFailed { role: WatcherRole, reason: String },
    /// The application process requested by `Launch` is running.
    ProcessSpawned { pid: u32 },
    /// The application process requested by `Launch` could not be started.
    LaunchFailed { reason: String },
    /// An application process exited, whether terminated by us or not.
    ProcessExited { pid: u32, code: Option<i32> },
    /// The restart window armed for `generation` ran out.
    RestartWindowElapsed { generation: u64 },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start a new application process.
    Launch,
    /// Ask an application process to terminate.
    Terminate { pid: u32 },
    /// Start (or replace) the restart window timer.
    ArmRestartWindow { generation: u64, window: Duration },
    /// Cancel the restart window timer.
    DisarmRestartWindow,
}

/// Why the session stopped, as decided by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    Shutdown,
    AppExited { pid: u32, code: Option<i32> },
    WatcherSetup { role: WatcherRole, reason: String },
    WatcherCrashed { role: WatcherRole, reason: String },
    LaunchFailed { reason: String },
    RestartStalled { old_pid: u32, window: Duration },
}

/// A session that ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Ctrl-C, or every event source went away.
    Shutdown,
    /// The application exited on its own (e.g. its window was closed).
    AppExited { pid: u32, code: Option<i32> },
}

impl SessionExit {
    /// Whether this exit is a failure of the session rather than a normal end.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionExit::Shutdown | SessionExit::AppExited { .. })
    }

    pub fn into_result(self) -> Result<SessionEnd> {
        match self {
            SessionExit::Shutdown => Ok(SessionEnd::Shutdown),
            SessionExit::AppExited { pid, code } => Ok(SessionEnd::AppExited { pid, code }),
            SessionExit::WatcherSetup { role, reason } => {
                Err(DevlaunchError::WatcherSetup { role, reason })
            }
            SessionExit::WatcherCrashed { role, reason } => {
                Err(DevlaunchError::WatcherCrashed { role, reason })
            }
            SessionExit::LaunchFailed { reason } => Err(DevlaunchError::Launch(reason)),
            SessionExit::RestartStalled { old_pid, window } => {
                Err(DevlaunchError::RestartStalled { old_pid, window })
            }
        }
    }
}

pub mod barrier;
pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod supervisor;

pub use barrier::ReadinessBarrier;
pub use self::core::SessionCore;
pub use event_handlers::CoreStep;
pub use runtime::Runtime;
pub use supervisor::{ProcessState, RestartIntent, Supervisor};
