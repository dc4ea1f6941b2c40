// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{error, info};

use crate::engine::barrier::ReadinessBarrier;
use crate::engine::supervisor::Supervisor;
use crate::engine::{SessionCommand, SessionExit};
use crate::report;
use crate::types::{BuildEvent, WatcherRole};

/// Decision returned by the core after handling a single `SessionEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<SessionCommand>,
    /// Set when the session is over; the shell stops after the commands.
    pub exit: Option<SessionExit>,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<SessionCommand>) -> Self {
        Self {
            commands,
            exit: None,
        }
    }

    pub fn exit(exit: SessionExit) -> Self {
        Self {
            commands: Vec::new(),
            exit: Some(exit),
        }
    }

    /// Whether the outer runtime loop should keep running.
    pub fn keep_running(&self) -> bool {
        self.exit.is_none()
    }
}

/// Handle a completed build from either watcher.
///
/// - Renderer builds are only reported; renderer readiness comes from the
///   serving layer (`ServingReady`).
/// - The first successful main build marks the main watcher ready.
/// - Every later successful main build asks the supervisor for a restart.
/// - Failed builds never change the supervisor state.
pub fn handle_build(
    barrier: &mut ReadinessBarrier,
    supervisor: &mut Supervisor,
    role: WatcherRole,
    event: BuildEvent,
) -> CoreStep {
    report::log_build_event(role, &event);

    if role != WatcherRole::Main || !event.is_success() {
        return CoreStep::continue_with(Vec::new());
    }

    if !barrier.is_ready(WatcherRole::Main) {
        return handle_readiness(barrier, supervisor, WatcherRole::Main);
    }

    CoreStep::continue_with(supervisor.request_restart())
}

/// Record readiness for `role`; the releasing signal launches the app.
pub fn handle_readiness(
    barrier: &mut ReadinessBarrier,
    supervisor: &mut Supervisor,
    role: WatcherRole,
) -> CoreStep {
    if barrier.mark_ready(role) {
        return CoreStep::continue_with(supervisor.launch());
    }
    if !barrier.is_released() {
        info!(%role, "watcher ready; waiting for the other one");
    }
    CoreStep::continue_with(Vec::new())
}

/// A watcher stopped. Before the barrier releases this is a setup failure,
/// afterwards the session has lost a build pipeline. Both are fatal.
pub fn handle_watcher_failure(
    barrier: &ReadinessBarrier,
    supervisor: &mut Supervisor,
    role: WatcherRole,
    reason: String,
) -> CoreStep {
    error!(%role, %reason, "build watcher failed");
    supervisor.stop();

    if barrier.is_released() {
        CoreStep::exit(SessionExit::WatcherCrashed { role, reason })
    } else {
        CoreStep::exit(SessionExit::WatcherSetup { role, reason })
    }
}
