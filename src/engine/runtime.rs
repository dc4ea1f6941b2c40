// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::ProcessBackend;

use super::core::SessionCore;
use super::event_handlers::CoreStep;
use super::{SessionCommand, SessionEnd, SessionEvent, SessionExit};

/// Drives the session core in response to `SessionEvent`s and delegates
/// process handling to a `ProcessBackend`.
///
/// The restart window is a deadline owned by this loop: arming replaces it,
/// disarming drops it, and when it passes the loop feeds
/// `RestartWindowElapsed` into the core like any other event.
///
/// This loop is the only receiver of the session channel, so it never sends
/// into it. Launch outcomes come back from the backend and are stepped
/// through the core before the next receive.
pub struct Runtime<P: ProcessBackend> {
    core: SessionCore,
    event_rx: mpsc::Receiver<SessionEvent>,
    backend: P,
    restart_deadline: Option<(u64, Instant)>,
}

impl<P: ProcessBackend> fmt::Debug for Runtime<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("restart_deadline", &self.restart_deadline)
            .finish_non_exhaustive()
    }
}

impl<P: ProcessBackend> Runtime<P> {
    pub fn new(core: SessionCore, event_rx: mpsc::Receiver<SessionEvent>, backend: P) -> Self {
        Self {
            core,
            event_rx,
            backend,
            restart_deadline: None,
        }
    }

    /// Main event loop. Returns once the core ends the session; the backend
    /// is shut down on every path out.
    pub async fn run(mut self) -> Result<SessionEnd> {
        info!("devlaunch runtime started");

        let result = self.event_loop().await;

        self.backend.shutdown().await;
        info!("runtime exiting");
        result
    }

    async fn event_loop(&mut self) -> Result<SessionEnd> {
        loop {
            let deadline = self.restart_deadline;

            let event = tokio::select! {
                received = self.event_rx.recv() => match received {
                    Some(event) => event,
                    None => {
                        info!("session event channel closed; exiting");
                        return Ok(SessionEnd::Shutdown);
                    }
                },
                generation = restart_window_elapsed(deadline) => {
                    SessionEvent::RestartWindowElapsed { generation }
                }
            };

            if let SessionEvent::RestartWindowElapsed { .. } = event {
                self.restart_deadline = None;
            }

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            if let Some(exit) = self.apply(step).await? {
                if exit.is_fatal() {
                    warn!(?exit, "session failed");
                } else {
                    info!(?exit, "session finished");
                }
                return exit.into_result();
            }
        }
    }

    /// Execute the commands of `step`, feeding launch outcomes back into the
    /// core as they arrive. Returns the exit that ends the session, if any.
    async fn apply(&mut self, step: CoreStep) -> Result<Option<SessionExit>> {
        let mut commands: VecDeque<SessionCommand> = step.commands.into();

        while let Some(command) = commands.pop_front() {
            let Some(event) = self.execute_command(command).await? else {
                continue;
            };

            debug!(?event, "launch outcome");
            let follow_up = self.core.step(event);
            if follow_up.exit.is_some() {
                return Ok(follow_up.exit);
            }
            commands.extend(follow_up.commands);
        }

        Ok(step.exit)
    }

    async fn execute_command(&mut self, command: SessionCommand) -> Result<Option<SessionEvent>> {
        match command {
            SessionCommand::Launch => {
                let outcome = self.backend.launch().await?;
                return Ok(outcome.into_event());
            }
            SessionCommand::Terminate { pid } => {
                if let Err(e) = self.backend.terminate(pid).await {
                    warn!(pid, error = %e, "failed to signal application process");
                }
            }
            SessionCommand::ArmRestartWindow { generation, window } => {
                debug!(generation, ?window, "restart window armed");
                self.restart_deadline = match Instant::now().checked_add(window) {
                    Some(at) => Some((generation, at)),
                    None => {
                        warn!(?window, "restart window out of range; it will not elapse");
                        None
                    }
                };
            }
            SessionCommand::DisarmRestartWindow => {
                debug!("restart window disarmed");
                self.restart_deadline = None;
            }
        }
        Ok(None)
    }
}

/// Resolves with the armed generation once its deadline passes; never
/// resolves when nothing is armed.
async fn restart_window_elapsed(deadline: Option<(u64, Instant)>) -> u64 {
    match deadline {
        Some((generation, at)) => {
            sleep_until(at).await;
            generation
        }
        None => std::future::pending().await,
    }
}
