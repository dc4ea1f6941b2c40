// src/watch/stream.rs

//! `stream` mode: a long-lived bundler running its own watch loop.
//!
//! Completions are recognised from the bundler's stdout/stderr lines with the
//! configured regexes; everything in between is kept as diagnostics.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::WatcherConfig;
use crate::exec::shell_command;
use crate::types::BuildEvent;
use crate::watch::diagnostics::DiagnosticBuffer;
use crate::watch::reporter::BuildReporter;

/// What a single line of bundler output means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Compiling,
    Succeeded,
    Failed,
    Other,
}

/// Compiled `*_on_output` regexes of a stream watcher.
#[derive(Debug, Clone)]
pub struct OutputClassifier {
    success: Regex,
    failure: Option<Regex>,
    compiling: Option<Regex>,
}

impl OutputClassifier {
    pub fn from_config(cfg: &WatcherConfig) -> Result<Self> {
        let success_pattern = cfg
            .success_on_output
            .as_deref()
            .context("stream watcher needs success_on_output")?;

        Ok(Self {
            success: compile("success_on_output", success_pattern)?,
            failure: cfg
                .failure_on_output
                .as_deref()
                .map(|p| compile("failure_on_output", p))
                .transpose()?,
            compiling: cfg
                .compiling_on_output
                .as_deref()
                .map(|p| compile("compiling_on_output", p))
                .transpose()?,
        })
    }

    /// Failure wins over success: bundlers often print both words on a
    /// failed compile ("compiled with errors").
    pub fn classify(&self, line: &str) -> LineKind {
        if self.failure.as_ref().is_some_and(|re| re.is_match(line)) {
            LineKind::Failed
        } else if self.success.is_match(line) {
            LineKind::Succeeded
        } else if self.compiling.as_ref().is_some_and(|re| re.is_match(line)) {
            LineKind::Compiling
        } else {
            LineKind::Other
        }
    }
}

fn compile(key: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("invalid {key} regex: {pattern}"))
}

/// Spawn the bundler and the task that classifies its output.
///
/// Spawn errors are returned directly (setup failure). Once running, the
/// bundler exiting for any reason is reported as `WatcherFailed`. Aborting the
/// returned task kills the bundler.
pub fn spawn_stream_watcher(
    cfg: &WatcherConfig,
    root: &Path,
    reporter: BuildReporter,
) -> Result<JoinHandle<()>> {
    let classifier = OutputClassifier::from_config(cfg)?;
    let role = reporter.role();

    let mut cmd = shell_command(&cfg.cmd);
    cmd.current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning {role} watcher command '{}'", cfg.cmd))?;

    info!(%role, pid = ?child.id(), cmd = %cfg.cmd, "build watcher started");

    // Both pipes feed one line channel; it closes when both reach EOF.
    let (line_tx, line_rx) = mpsc::channel::<String>(256);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, line_tx.clone()));
    }
    drop(line_tx);

    Ok(tokio::spawn(run_stream(child, line_rx, classifier, reporter)))
}

async fn run_stream(
    mut child: Child,
    mut lines: mpsc::Receiver<String>,
    classifier: OutputClassifier,
    mut reporter: BuildReporter,
) {
    let mut diagnostics = DiagnosticBuffer::default();

    while let Some(line) = lines.recv().await {
        if !handle_line(&line, &classifier, &mut diagnostics, &mut reporter).await {
            return;
        }
    }

    let reason = match child.wait().await {
        Ok(status) => format!("watcher command exited ({status})"),
        Err(e) => format!("waiting for watcher command: {e}"),
    };
    reporter.failed(reason).await;
}

/// Returns `false` when the runtime is gone.
async fn handle_line(
    line: &str,
    classifier: &OutputClassifier,
    diagnostics: &mut DiagnosticBuffer,
    reporter: &mut BuildReporter,
) -> bool {
    debug!(role = %reporter.role(), "watcher output: {}", line);

    if !reporter.observe_line(line).await {
        return false;
    }

    match classifier.classify(line) {
        LineKind::Compiling => {
            diagnostics.clear();
            reporter.compiling().await
        }
        LineKind::Succeeded => {
            diagnostics.push(line);
            reporter.report(BuildEvent::success(diagnostics.take())).await
        }
        LineKind::Failed => {
            diagnostics.push(line);
            reporter.report(BuildEvent::failure(diagnostics.take())).await
        }
        LineKind::Other => {
            diagnostics.push(line);
            true
        }
    }
}

async fn forward_lines<R>(reader: R, line_tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line_tx.send(line).await.is_err() {
            break;
        }
    }
}
