// src/exec/app_process.rs

//! One running application process.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::engine::SessionEvent;
use crate::exec::launch::AppLaunchSpec;
use crate::report;

/// How long a terminated process gets to exit before it is killed.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// Handle to a spawned application process.
///
/// The `Child` is moved into a background wait task, which reports
/// `SessionEvent::ProcessExited` when the process ends for any reason,
/// including a termination we requested. Dropping the handle terminates the
/// process.
#[derive(Debug)]
pub struct AppProcess {
    pid: u32,
    terminate_tx: Option<oneshot::Sender<()>>,
    exited_rx: watch::Receiver<bool>,
}

impl AppProcess {
    /// Spawn the application and start observing it.
    ///
    /// The spawn itself is not reported here: the caller hands the pid to the
    /// runtime, which handles it before reading the exit from `runtime_tx`.
    pub fn start(
        spec: &AppLaunchSpec,
        runtime_tx: mpsc::Sender<SessionEvent>,
    ) -> Result<Self> {
        info!(cmd = %spec.display(), "starting application process");

        let mut child = spec
            .command()
            .spawn()
            .with_context(|| format!("spawning {}", spec.executable.display()))?;

        let pid = child
            .id()
            .context("application process exited before its pid could be read")?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, "stderr"));
        }

        let (terminate_tx, terminate_rx) = oneshot::channel::<()>();
        let (exited_tx, exited_rx) = watch::channel(false);

        tokio::spawn(wait_for_exit(child, pid, terminate_rx, runtime_tx, exited_tx));

        Ok(Self {
            pid,
            terminate_tx: Some(terminate_tx),
            exited_rx,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn has_exited(&self) -> bool {
        *self.exited_rx.borrow()
    }

    /// Ask the wait task to terminate the process. Returns `false` if a
    /// termination was already requested or the process is gone.
    pub fn request_terminate(&mut self) -> bool {
        match self.terminate_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Resolve once the process has exited.
    pub async fn wait_exited(&mut self) {
        // An error means the wait task is gone, which only happens after exit.
        let _ = self.exited_rx.wait_for(|exited| *exited).await;
    }
}

/// Background task: owns `child`, waits for it to exit, emits `ProcessExited`.
///
/// Two ways the task can end:
/// 1. The process exits on its own (window closed, crash).
/// 2. A termination request arrives (or the handle is dropped): signal the
///    process and wait for it.
async fn wait_for_exit(
    mut child: Child,
    pid: u32,
    terminate_rx: oneshot::Receiver<()>,
    runtime_tx: mpsc::Sender<SessionEvent>,
    exited_tx: watch::Sender<bool>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = terminate_rx => {
            debug!(pid, "terminating application process");
            terminate_child(&mut child, pid).await
        }
    };

    let _ = exited_tx.send(true);

    let code = match status {
        Ok(status) => {
            info!(pid, exit_code = ?status.code(), success = status.success(), "application process exited");
            status.code()
        }
        Err(e) => {
            warn!(pid, error = %e, "error waiting for application process");
            None
        }
    };

    if runtime_tx
        .send(SessionEvent::ProcessExited { pid, code })
        .await
        .is_err()
    {
        debug!(pid, "runtime gone; exit not reported");
    }
}

/// SIGTERM, then SIGKILL if the process outlives [`TERMINATE_GRACE`].
#[cfg(unix)]
async fn terminate_child(child: &mut Child, pid: u32) -> io::Result<ExitStatus> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(pid, grace = ?TERMINATE_GRACE, "application ignored SIGTERM; killing");
            child.kill().await?;
            child.wait().await
        }
    }
}

#[cfg(not(unix))]
async fn terminate_child(child: &mut Child, _pid: u32) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

/// Log every output line of the application until the pipe closes.
async fn forward_output<R>(reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        report::log_app_output(stream, &line);
    }
}
