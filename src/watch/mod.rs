// src/watch/mod.rs

//! Build watchers.
//!
//! A build watcher turns an external bundler into a stream of
//! `SessionEvent`s (`BuildStarted`, `Build`, `ServingReady`,
//! `WatcherFailed`). Two modes exist:
//! - [`stream`]: the bundler runs its own watch loop; completions are read
//!   from its output.
//! - [`files`]: `notify` watches the sources and the bundler is re-run as a
//!   one-shot build.
//!
//! Watchers know nothing about the application process; they only report.

pub mod diagnostics;
pub mod files;
pub mod patterns;
pub mod reporter;
pub mod stream;

use std::path::Path;

use anyhow::Result;
use notify::RecommendedWatcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::WatcherConfig;
use crate::engine::SessionEvent;
use crate::types::{WatchMode, WatcherRole};

pub use diagnostics::{DiagnosticBuffer, MAX_DIAGNOSTIC_LINES};
pub use patterns::WatchProfile;
pub use reporter::{BuildReporter, ServeReadiness};
pub use stream::{LineKind, OutputClassifier};

/// Handle for one running build watcher.
///
/// Dropping the handle stops the watcher: the event task is aborted (which
/// kills a `stream` bundler) and the filesystem watcher is released.
pub struct WatcherHandle {
    role: WatcherRole,
    task: JoinHandle<()>,
    _fs_watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        debug!(role = %self.role, "stopping build watcher");
        self.task.abort();
    }
}

/// Start the build watcher for `role`.
///
/// `root` is the project root: the working directory of the watcher command
/// and the base of all glob patterns. Errors returned here are setup
/// failures; anything that goes wrong later arrives as
/// `SessionEvent::WatcherFailed`.
pub fn spawn_build_watcher(
    role: WatcherRole,
    cfg: &WatcherConfig,
    root: &Path,
    runtime_tx: mpsc::Sender<SessionEvent>,
) -> Result<WatcherHandle> {
    let readiness = ServeReadiness::for_watcher(role, cfg)?;
    let reporter = BuildReporter::new(role, readiness, runtime_tx);

    let (task, fs_watcher) = match cfg.mode {
        WatchMode::Stream => (stream::spawn_stream_watcher(cfg, root, reporter)?, None),
        WatchMode::Files => {
            let (watcher, task) = files::spawn_files_watcher(cfg, root, reporter)?;
            (task, Some(watcher))
        }
    };

    Ok(WatcherHandle {
        role,
        task,
        _fs_watcher: fs_watcher,
    })
}
