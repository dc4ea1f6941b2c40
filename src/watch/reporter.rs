// src/watch/reporter.rs

//! Turns watcher observations into `SessionEvent`s.
//!
//! Both watcher modes report through a [`BuildReporter`], which also owns the
//! renderer's serving readiness: depending on the config it is signalled by
//! an output line, by a successful TCP probe of the dev server port, or by
//! the first successful build.

use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::WatcherConfig;
use crate::engine::SessionEvent;
use crate::types::{BuildEvent, WatcherRole};

/// Interval between connection attempts when probing the dev server.
pub const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// How the renderer confirms its output can be served.
#[derive(Debug, Clone)]
pub enum ServeReadiness {
    /// A line of bundler output matches.
    OnOutput(Regex),
    /// `127.0.0.1:<port>` accepts a connection after the first success.
    Port(u16),
    /// The first successful build is enough.
    FirstSuccess,
}

impl ServeReadiness {
    /// Readiness rule for a watcher; the main watcher has none.
    pub fn for_watcher(role: WatcherRole, cfg: &WatcherConfig) -> Result<Option<Self>> {
        if role == WatcherRole::Main {
            return Ok(None);
        }

        if let Some(ref pattern) = cfg.ready_on_output {
            let re = Regex::new(pattern)
                .with_context(|| format!("invalid ready_on_output regex: {pattern}"))?;
            return Ok(Some(ServeReadiness::OnOutput(re)));
        }

        Ok(Some(match cfg.serve_port {
            Some(port) => ServeReadiness::Port(port),
            None => ServeReadiness::FirstSuccess,
        }))
    }
}

/// Event sink for one watcher.
///
/// Every method returns `false` once the runtime has gone away, which tells
/// the watcher loop to stop.
#[derive(Debug)]
pub struct BuildReporter {
    role: WatcherRole,
    runtime_tx: mpsc::Sender<SessionEvent>,
    /// Pending readiness rule; `None` once readiness has been signalled (or
    /// for the main watcher).
    readiness: Option<ServeReadiness>,
    probe: Option<JoinHandle<()>>,
}

impl BuildReporter {
    pub fn new(
        role: WatcherRole,
        readiness: Option<ServeReadiness>,
        runtime_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            role,
            runtime_tx,
            readiness,
            probe: None,
        }
    }

    pub fn role(&self) -> WatcherRole {
        self.role
    }

    pub async fn compiling(&self) -> bool {
        self.send(SessionEvent::BuildStarted { role: self.role }).await
    }

    pub async fn report(&mut self, event: BuildEvent) -> bool {
        let success = event.is_success();

        if !self
            .send(SessionEvent::Build {
                role: self.role,
                event,
            })
            .await
        {
            return false;
        }

        if !success {
            return true;
        }

        match self.readiness {
            Some(ServeReadiness::FirstSuccess) => self.serving_ready().await,
            Some(ServeReadiness::Port(port)) if self.probe.is_none() => {
                info!(port, "probing dev server");
                self.probe = Some(tokio::spawn(probe_port(port, self.runtime_tx.clone())));
                true
            }
            _ => true,
        }
    }

    /// Feed one line of watcher output to the output-based readiness rule.
    pub async fn observe_line(&mut self, line: &str) -> bool {
        let matched = match &self.readiness {
            Some(ServeReadiness::OnOutput(re)) => re.is_match(line),
            _ => false,
        };

        if matched {
            self.serving_ready().await
        } else {
            true
        }
    }

    pub async fn failed(&self, reason: String) -> bool {
        self.send(SessionEvent::WatcherFailed {
            role: self.role,
            reason,
        })
        .await
    }

    async fn serving_ready(&mut self) -> bool {
        self.readiness = None;
        info!(role = %self.role, "dev server can serve output");
        self.send(SessionEvent::ServingReady).await
    }

    async fn send(&self, event: SessionEvent) -> bool {
        if self.runtime_tx.send(event).await.is_err() {
            debug!(role = %self.role, "runtime gone; watcher event dropped");
            return false;
        }
        true
    }
}

impl Drop for BuildReporter {
    fn drop(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
    }
}

/// Retry connecting to the dev server until it accepts, then signal readiness.
async fn probe_port(port: u16, runtime_tx: mpsc::Sender<SessionEvent>) {
    loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(_) => {
                info!(port, "dev server accepting connections");
                let _ = runtime_tx.send(SessionEvent::ServingReady).await;
                return;
            }
            Err(e) => {
                debug!(port, error = %e, "dev server not accepting connections yet");
                sleep(PROBE_INTERVAL).await;
            }
        }
    }
}
