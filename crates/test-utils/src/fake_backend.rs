use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use devlaunch::engine::SessionEvent;
use devlaunch::errors::Result;
use devlaunch::exec::{LaunchOutcome, ProcessBackend};

/// What a `FakeProcessBackend` was asked to do.
#[derive(Debug, Default, Clone)]
pub struct FakeProcessLog {
    /// Pids handed out, in launch order.
    pub launched: Vec<u32>,
    /// Pids that were asked to terminate, in order.
    pub terminated: Vec<u32>,
    pub launch_attempts: usize,
    pub shut_down: bool,
}

/// How a launch attempt behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Spawn,
    Fail,
    /// Never reports anything, like a process stuck before it starts.
    Hang,
}

/// A fake backend that:
/// - hands out pids 100, 101, ... and returns them from `launch`
/// - optionally fails or hangs from the n-th attempt on
/// - reports `ProcessExited` for every terminated pid unless silenced
///
/// Exits are sent from a spawned task, the way the real wait task does, so
/// the runtime never blocks on its own channel.
pub struct FakeProcessBackend {
    runtime_tx: mpsc::Sender<SessionEvent>,
    log: Arc<Mutex<FakeProcessLog>>,
    next_pid: u32,
    degrade_from: Option<(usize, Attempt)>,
    exit_on_terminate: bool,
}

impl FakeProcessBackend {
    pub fn new(runtime_tx: mpsc::Sender<SessionEvent>, log: Arc<Mutex<FakeProcessLog>>) -> Self {
        Self {
            runtime_tx,
            log,
            next_pid: 100,
            degrade_from: None,
            exit_on_terminate: true,
        }
    }

    /// Launch attempt `attempt` (1-based) and every later one fail.
    pub fn failing_from_attempt(mut self, attempt: usize) -> Self {
        self.degrade_from = Some((attempt, Attempt::Fail));
        self
    }

    /// Launch attempt `attempt` (1-based) and every later one never report.
    pub fn hanging_from_attempt(mut self, attempt: usize) -> Self {
        self.degrade_from = Some((attempt, Attempt::Hang));
        self
    }

    fn attempt(&self, attempt: usize) -> Attempt {
        match self.degrade_from {
            Some((from, behaviour)) if attempt >= from => behaviour,
            _ => Attempt::Spawn,
        }
    }

    /// Terminated processes never report an exit.
    pub fn silent_terminations(mut self) -> Self {
        self.exit_on_terminate = false;
        self
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn launch(&mut self) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>> {
        Box::pin(async move {
            let attempt = self.log.lock().unwrap().launch_attempts + 1;

            let outcome = match self.attempt(attempt) {
                Attempt::Spawn => {
                    let pid = self.next_pid;
                    self.next_pid += 1;
                    self.log.lock().unwrap().launched.push(pid);
                    LaunchOutcome::Spawned { pid }
                }
                Attempt::Fail => LaunchOutcome::Failed {
                    reason: format!("fake launch failure on attempt {attempt}"),
                },
                Attempt::Hang => LaunchOutcome::Deferred,
            };

            self.log.lock().unwrap().launch_attempts = attempt;
            Ok(outcome)
        })
    }

    fn terminate(&mut self, pid: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.log.lock().unwrap().terminated.push(pid);
            if self.exit_on_terminate {
                let tx = self.runtime_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(SessionEvent::ProcessExited { pid, code: None }).await;
                });
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.log.lock().unwrap().shut_down = true;
        })
    }
}
