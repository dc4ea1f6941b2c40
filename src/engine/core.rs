// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "session core" that
//! consumes [`SessionEvent`]s and produces:
//! - an updated core state
//! - a list of [`SessionCommand`](crate::engine::SessionCommand)s describing
//!   what the IO shell should do next
//! - optionally, the reason the session is over
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from the channel, running the restart window timer and talking to
//! the process backend. The core has no channels, no Tokio types, and does
//! not perform any IO, so every ordering of events can be unit tested.

use std::time::Duration;

use crate::engine::barrier::ReadinessBarrier;
use crate::engine::event_handlers::{
    handle_build, handle_readiness, handle_watcher_failure, CoreStep,
};
use crate::engine::supervisor::{ProcessState, RestartIntent, Supervisor};
use crate::engine::{SessionEvent, SessionExit};
use crate::report;
use crate::types::WatcherRole;

#[derive(Debug)]
pub struct SessionCore {
    barrier: ReadinessBarrier,
    supervisor: Supervisor,
}

impl SessionCore {
    pub fn new(restart_window: Duration) -> Self {
        Self {
            barrier: ReadinessBarrier::new(),
            supervisor: Supervisor::new(restart_window),
        }
    }

    pub fn process_state(&self) -> ProcessState {
        self.supervisor.state()
    }

    pub fn restart_intent(&self) -> Option<RestartIntent> {
        self.supervisor.restart_intent()
    }

    pub fn has_pending_restart(&self) -> bool {
        self.supervisor.has_pending_restart()
    }

    pub fn is_ready(&self, role: WatcherRole) -> bool {
        self.barrier.is_ready(role)
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SessionEvent) -> CoreStep {
        match event {
            SessionEvent::BuildStarted { role } => {
                report::log_compiling(role);
                CoreStep::continue_with(Vec::new())
            }
            SessionEvent::Build { role, event } => {
                handle_build(&mut self.barrier, &mut self.supervisor, role, event)
            }
            SessionEvent::ServingReady => handle_readiness(
                &mut self.barrier,
                &mut self.supervisor,
                WatcherRole::Renderer,
            ),
            SessionEvent::WatcherFailed { role, reason } => {
                handle_watcher_failure(&self.barrier, &mut self.supervisor, role, reason)
            }
            SessionEvent::ProcessSpawned { pid } => self.supervisor.on_spawned(pid),
            SessionEvent::LaunchFailed { reason } => self.supervisor.on_launch_failed(reason),
            SessionEvent::ProcessExited { pid, code } => self.supervisor.on_exited(pid, code),
            SessionEvent::RestartWindowElapsed { generation } => {
                self.supervisor.on_window_elapsed(generation)
            }
            SessionEvent::ShutdownRequested => {
                self.supervisor.stop();
                CoreStep::exit(SessionExit::Shutdown)
            }
        }
    }
}
