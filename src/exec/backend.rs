// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The runtime talks to a `ProcessBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation in [`app_process`](super::app_process).
//!
//! Spawn results are returned to the runtime, which steps the core with them
//! before it reads the session channel again. Only `ProcessExited` travels
//! through the channel, sent from a task the backend spawned. The runtime is
//! the channel's only receiver and must never wait on a send into it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::engine::SessionEvent;
use crate::errors::Result;

use super::app_process::{AppProcess, TERMINATE_GRACE};
use super::launch::AppLaunchSpec;

/// Result of one launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Spawned { pid: u32 },
    Failed { reason: String },
    /// Nothing to report yet; the backend sends the outcome later through
    /// the session channel from a task of its own.
    Deferred,
}

impl LaunchOutcome {
    /// The event the core should see for this outcome, if any.
    pub fn into_event(self) -> Option<SessionEvent> {
        match self {
            LaunchOutcome::Spawned { pid } => Some(SessionEvent::ProcessSpawned { pid }),
            LaunchOutcome::Failed { reason } => Some(SessionEvent::LaunchFailed { reason }),
            LaunchOutcome::Deferred => None,
        }
    }
}

/// Trait abstracting how the application process is started and stopped.
pub trait ProcessBackend: Send {
    /// Start one application process.
    ///
    /// A spawn error is an `Ok(LaunchOutcome::Failed)`; `Err` is reserved
    /// for the backend itself being unusable.
    fn launch(&mut self) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>>;

    /// Signal the process `pid` to terminate. Its exit is reported later as
    /// `ProcessExited`.
    fn terminate(&mut self, pid: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop everything still running; called once when the session ends.
    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Real process backend used in production.
#[derive(Debug)]
pub struct RealProcessBackend {
    spec: AppLaunchSpec,
    runtime_tx: mpsc::Sender<SessionEvent>,
    processes: HashMap<u32, AppProcess>,
}

impl RealProcessBackend {
    pub fn new(spec: AppLaunchSpec, runtime_tx: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            spec,
            runtime_tx,
            processes: HashMap::new(),
        }
    }
}

impl ProcessBackend for RealProcessBackend {
    fn launch(&mut self) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>> {
        Box::pin(async move {
            self.processes.retain(|_, p| !p.has_exited());

            match AppProcess::start(&self.spec, self.runtime_tx.clone()) {
                Ok(process) => {
                    let pid = process.pid();
                    self.processes.insert(pid, process);
                    Ok(LaunchOutcome::Spawned { pid })
                }
                Err(err) => Ok(LaunchOutcome::Failed {
                    reason: format!("{err:#}"),
                }),
            }
        })
    }

    fn terminate(&mut self, pid: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match self.processes.get_mut(&pid) {
                Some(process) => {
                    if !process.request_terminate() {
                        debug!(pid, "process already terminating or gone");
                    }
                    Ok(())
                }
                None => Err(anyhow!("no application process with pid {pid}").into()),
            }
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            for process in self.processes.values_mut() {
                process.request_terminate();
            }

            let limit = TERMINATE_GRACE + Duration::from_secs(1);
            for (pid, process) in self.processes.iter_mut() {
                if timeout(limit, process.wait_exited()).await.is_err() {
                    warn!(pid, "application process still running at shutdown");
                }
            }

            self.processes.clear();
        })
    }
}
