// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile, WatcherConfig};
use crate::engine::{Runtime, SessionCore, SessionEnd, SessionEvent};
use crate::errors::{DevlaunchError, Result};
use crate::exec::{AppLaunchSpec, RealProcessBackend};
use crate::types::WatcherRole;
use crate::watch::{spawn_build_watcher, WatcherHandle};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - both build watchers (started before the runtime, in either order)
/// - the process backend
/// - the session core and its runtime loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<SessionEnd> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    if let Some(window) = args.restart_window {
        cfg.restart_window = window;
    }

    let root = config_root_dir(&config_path);
    let launch = AppLaunchSpec::from_config(&cfg, &root);

    if args.dry_run {
        print_dry_run(&cfg, &root, &launch);
        return Ok(SessionEnd::Shutdown);
    }

    let (rt_tx, rt_rx) = mpsc::channel::<SessionEvent>(64);

    info!("getting ready...");

    // A setup error on the second watcher drops the first one, which stops it.
    let _renderer = start_watcher(WatcherRole::Renderer, &cfg, &root, &rt_tx)?;
    let _main = start_watcher(WatcherRole::Main, &cfg, &root, &rt_tx)?;

    let backend = RealProcessBackend::new(launch, rt_tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(SessionEvent::ShutdownRequested).await;
        });
    }

    let core = SessionCore::new(cfg.restart_window);
    let runtime = Runtime::new(core, rt_rx, backend);
    runtime.run().await
}

fn start_watcher(
    role: WatcherRole,
    cfg: &ConfigFile,
    root: &Path,
    rt_tx: &mpsc::Sender<SessionEvent>,
) -> Result<WatcherHandle> {
    spawn_build_watcher(role, cfg.watcher(role), root, rt_tx.clone()).map_err(|e| {
        DevlaunchError::WatcherSetup {
            role,
            reason: format!("{e:#}"),
        }
    })
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "app/DevLaunch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "DevLaunch.toml" (parent = ""),
///   we fall back to the current working directory.
///
/// The result is absolute: the application runs with its own cwd, so a
/// relative entry path would resolve against the wrong directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd,
    }
}

/// Simple dry-run output: print both watchers and the launch command.
fn print_dry_run(cfg: &ConfigFile, root: &Path, launch: &AppLaunchSpec) {
    println!("devlaunch dry-run");
    println!("  root = {}", root.display());
    println!("  session.restart_window = {:?}", cfg.restart_window);
    println!();

    for role in [WatcherRole::Renderer, WatcherRole::Main] {
        print_watcher(role, cfg.watcher(role));
    }

    println!("app:");
    println!("    launch: {}", launch.display());
    println!("    cwd: {}", launch.cwd.display());
    for (key, value) in &launch.env {
        println!("    env: {key}={value}");
    }

    debug!("dry-run complete (nothing started)");
}

fn print_watcher(role: WatcherRole, watcher: &WatcherConfig) {
    println!("{role} watcher:");
    println!("    mode: {:?}", watcher.mode);
    println!("    cmd: {}", watcher.cmd);
    for (key, value) in [
        ("success_on_output", &watcher.success_on_output),
        ("failure_on_output", &watcher.failure_on_output),
        ("compiling_on_output", &watcher.compiling_on_output),
        ("ready_on_output", &watcher.ready_on_output),
    ] {
        if let Some(value) = value {
            println!("    {key}: {value}");
        }
    }
    if let Some(port) = watcher.serve_port {
        println!("    serve_port: {port}");
    }
    if !watcher.watch.is_empty() {
        println!("    watch: {:?}", watcher.watch);
        println!("    debounce: {:?}", watcher.debounce_duration());
    }
    if !watcher.exclude.is_empty() {
        println!("    exclude: {:?}", watcher.exclude);
    }
    if let Some(ref output) = watcher.output {
        println!("    output: {output}");
    }
    println!();
}
