// src/watch/files.rs

//! `files` mode: devlaunch watches the sources and re-runs a one-shot build.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::WatcherConfig;
use crate::exec::shell_command;
use crate::types::BuildEvent;
use crate::watch::diagnostics::DiagnosticBuffer;
use crate::watch::patterns::WatchProfile;
use crate::watch::reporter::BuildReporter;

/// Start a filesystem watcher on `root` and the task that runs builds.
///
/// The returned `RecommendedWatcher` must be kept alive for as long as
/// changes should be observed.
pub fn spawn_files_watcher(
    cfg: &WatcherConfig,
    root: &Path,
    reporter: BuildReporter,
) -> Result<(RecommendedWatcher, JoinHandle<()>)> {
    let profile = WatchProfile::new(&cfg.watch, &cfg.exclude)?;
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let role = reporter.role();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // The receiver is gone once the watcher task stops.
                let _ = event_tx.send(event);
            }
            Err(err) => {
                warn!(%role, error = %err, "file watch error");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", root.display()))?;

    info!(%role, root = ?root, cmd = %cfg.cmd, "file watcher started");

    let builder = FileBuilder {
        root,
        profile,
        cmd: cfg.cmd.clone(),
        debounce: cfg.debounce_duration(),
        changes: event_rx,
        reporter,
    };

    Ok((watcher, tokio::spawn(builder.run())))
}

struct FileBuilder {
    root: PathBuf,
    profile: WatchProfile,
    cmd: String,
    debounce: Duration,
    changes: mpsc::UnboundedReceiver<Event>,
    reporter: BuildReporter,
}

impl FileBuilder {
    /// Initial build, then one build per batch of relevant changes. Builds
    /// never overlap; changes seen during a build coalesce into one rebuild.
    async fn run(mut self) {
        let mut rebuild = true;
        let mut initial = true;

        loop {
            if !rebuild {
                let Some(event) = self.changes.recv().await else {
                    debug!("file watcher channel closed");
                    return;
                };
                if !self.is_relevant(&event) {
                    continue;
                }
            }

            if !initial {
                self.settle().await;
            }
            initial = false;

            match self.build_once().await {
                Ok(true) => {}
                Ok(false) => return,
                Err(err) => {
                    self.reporter.failed(format!("{err:#}")).await;
                    return;
                }
            }

            rebuild = self.drain_relevant();
            if rebuild {
                debug!("sources changed during build; rebuilding");
            }
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event
            .paths
            .iter()
            .any(|path| self.profile.matches_path(&self.root, path))
    }

    /// Wait until no change has arrived for one debounce period.
    async fn settle(&mut self) {
        while let Ok(Some(_)) = timeout(self.debounce, self.changes.recv()).await {}
    }

    fn drain_relevant(&mut self) -> bool {
        let mut relevant = false;
        while let Ok(event) = self.changes.try_recv() {
            relevant |= self.is_relevant(&event);
        }
        relevant
    }

    /// Run the build command once. `Ok(false)` means the runtime is gone;
    /// `Err` means the command could not be run at all.
    async fn build_once(&mut self) -> Result<bool> {
        if !self.reporter.compiling().await {
            return Ok(false);
        }

        let mut cmd = shell_command(&self.cmd);
        cmd.current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("running build command '{}'", self.cmd))?;

        let mut diagnostics = DiagnosticBuffer::default();
        for text in [&output.stdout, &output.stderr] {
            for line in String::from_utf8_lossy(text).lines() {
                diagnostics.push(line);
            }
        }

        debug!(
            role = %self.reporter.role(),
            status = %output.status,
            lines = diagnostics.len(),
            "build command finished"
        );

        let event = if output.status.success() {
            BuildEvent::success(diagnostics.take())
        } else {
            BuildEvent::failure(diagnostics.take())
        };

        Ok(self.reporter.report(event).await)
    }
}
