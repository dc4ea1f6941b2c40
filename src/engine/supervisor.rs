// src/engine/supervisor.rs

//! Lifecycle state of the single supervised application process.
//!
//! The supervisor is the only owner of the process record and of the restart
//! intent. It never touches a process itself: every transition returns the
//! [`SessionCommand`]s the runtime has to carry out, and process reports come
//! back in as method calls from the core.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::event_handlers::CoreStep;
use crate::engine::{SessionCommand, SessionExit};

/// Where the supervised process is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Nothing launched yet (waiting on the readiness barrier).
    Idle,
    /// First launch requested, no pid reported yet.
    Launching,
    Running { pid: u32 },
    /// `replaced_pid` was told to terminate and a replacement was requested.
    Restarting { replaced_pid: u32 },
    Stopped,
}

/// Record of a termination the supervisor initiated itself.
///
/// While present, an exit report for `terminated_pid` is expected and is not
/// treated as the application going away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartIntent {
    pub terminated_pid: u32,
    pub generation: u64,
}

#[derive(Debug)]
pub struct Supervisor {
    state: ProcessState,
    intent: Option<RestartIntent>,
    /// A rebuild arrived while a launch was still in flight.
    pending_restart: bool,
    generation: u64,
    restart_window: Duration,
}

impl Supervisor {
    pub fn new(restart_window: Duration) -> Self {
        Self {
            state: ProcessState::Idle,
            intent: None,
            pending_restart: false,
            generation: 0,
            restart_window,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn restart_intent(&self) -> Option<RestartIntent> {
        self.intent
    }

    pub fn has_pending_restart(&self) -> bool {
        self.pending_restart
    }

    /// `Idle -> Launching`. Only the first call has an effect.
    pub fn launch(&mut self) -> Vec<SessionCommand> {
        if self.state != ProcessState::Idle {
            warn!(state = ?self.state, "launch requested more than once; ignoring");
            return Vec::new();
        }

        info!("both builds ready; launching application");
        self.state = ProcessState::Launching;
        vec![SessionCommand::Launch]
    }

    /// A new main-process build is available.
    ///
    /// - `Running`: terminate the current process and launch a replacement.
    /// - `Launching` / `Restarting`: remember one restart for when the
    ///   in-flight launch reports back; further rebuilds coalesce into it.
    /// - `Idle`: nothing to do, the first launch uses the newest output.
    pub fn request_restart(&mut self) -> Vec<SessionCommand> {
        match self.state {
            ProcessState::Running { pid } => {
                self.generation += 1;
                self.intent = Some(RestartIntent {
                    terminated_pid: pid,
                    generation: self.generation,
                });
                self.state = ProcessState::Restarting { replaced_pid: pid };

                info!(pid, generation = self.generation, "restarting application");

                vec![
                    SessionCommand::Terminate { pid },
                    SessionCommand::Launch,
                    SessionCommand::ArmRestartWindow {
                        generation: self.generation,
                        window: self.restart_window,
                    },
                ]
            }
            ProcessState::Launching | ProcessState::Restarting { .. } => {
                debug!(
                    state = ?self.state,
                    already_pending = self.pending_restart,
                    "launch in flight; coalescing rebuild into one pending restart"
                );
                self.pending_restart = true;
                Vec::new()
            }
            ProcessState::Idle => {
                debug!("application not launched yet; first launch will use this build");
                Vec::new()
            }
            ProcessState::Stopped => Vec::new(),
        }
    }

    /// The process requested by the last `Launch` is running as `pid`.
    pub fn on_spawned(&mut self, pid: u32) -> CoreStep {
        let mut commands = Vec::new();

        match self.state {
            ProcessState::Launching => {
                info!(pid, "application running");
                self.state = ProcessState::Running { pid };
            }
            ProcessState::Restarting { replaced_pid } => {
                info!(old_pid = replaced_pid, pid, "application replaced");
                self.state = ProcessState::Running { pid };
                self.intent = None;
                commands.push(SessionCommand::DisarmRestartWindow);
            }
            other => {
                // Never keep an untracked process alive next to the tracked one.
                warn!(pid, state = ?other, "unexpected spawn report; terminating stray process");
                commands.push(SessionCommand::Terminate { pid });
                return CoreStep::continue_with(commands);
            }
        }

        if self.pending_restart {
            self.pending_restart = false;
            commands.extend(self.request_restart());
        }

        CoreStep::continue_with(commands)
    }

    /// The process requested by the last `Launch` could not be started.
    ///
    /// Always fatal, including during a restart.
    pub fn on_launch_failed(&mut self, reason: String) -> CoreStep {
        warn!(state = ?self.state, %reason, "application launch failed");
        self.state = ProcessState::Stopped;
        self.intent = None;
        self.pending_restart = false;
        CoreStep::exit(SessionExit::LaunchFailed { reason })
    }

    /// Some application process exited.
    pub fn on_exited(&mut self, pid: u32, code: Option<i32>) -> CoreStep {
        if let Some(intent) = self.intent {
            if intent.terminated_pid == pid {
                debug!(pid, ?code, "replaced process exited as expected");
                return CoreStep::continue_with(Vec::new());
            }
        }

        match self.state {
            ProcessState::Running { pid: tracked } if tracked == pid => {
                info!(pid, ?code, "application exited; ending session");
                self.state = ProcessState::Stopped;
                CoreStep::exit(SessionExit::AppExited { pid, code })
            }
            _ => {
                debug!(pid, ?code, state = ?self.state, "exit of untracked process ignored");
                CoreStep::continue_with(Vec::new())
            }
        }
    }

    /// The restart window armed for `generation` ran out.
    ///
    /// Clears the intent unconditionally. A replacement that still is not
    /// running at this point ends the session.
    pub fn on_window_elapsed(&mut self, generation: u64) -> CoreStep {
        match self.intent {
            Some(intent) if intent.generation == generation => {}
            _ => {
                debug!(generation, "stale restart window ignored");
                return CoreStep::continue_with(Vec::new());
            }
        }

        self.intent = None;

        if let ProcessState::Restarting { replaced_pid } = self.state {
            warn!(
                old_pid = replaced_pid,
                window = ?self.restart_window,
                "replacement process not running after restart window"
            );
            self.state = ProcessState::Stopped;
            return CoreStep::exit(SessionExit::RestartStalled {
                old_pid: replaced_pid,
                window: self.restart_window,
            });
        }

        CoreStep::continue_with(Vec::new())
    }

    /// Mark the supervisor stopped because the session is ending.
    pub fn stop(&mut self) {
        self.state = ProcessState::Stopped;
        self.intent = None;
        self.pending_restart = false;
    }
}
