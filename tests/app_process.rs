// tests/app_process.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, main_build, with_timeout};

use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use devlaunch::engine::{Runtime, SessionCore, SessionEnd, SessionEvent};
use devlaunch::types::WatcherRole;
use devlaunch::exec::{AppLaunchSpec, LaunchOutcome, ProcessBackend, RealProcessBackend};

type TestResult = Result<(), Box<dyn Error>>;

/// `sh -c <script> <entry>`: the entry lands in `$0`, like the compiled
/// main file would for a real runtime.
fn sh_spec(script: &str, cwd: PathBuf) -> AppLaunchSpec {
    AppLaunchSpec {
        executable: PathBuf::from("sh"),
        args: vec!["-c".to_string(), script.to_string()],
        entry: cwd.join("dist/main.js"),
        cwd,
        env: BTreeMap::new(),
    }
}

async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    with_timeout(rx.recv()).await.expect("event channel closed")
}

async fn expect_spawned(backend: &mut RealProcessBackend) -> u32 {
    match backend.launch().await.expect("backend usable") {
        LaunchOutcome::Spawned { pid } => pid,
        other => panic!("expected a spawned process, got {other:?}"),
    }
}

#[tokio::test]
async fn terminate_reports_exit_of_same_pid() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(16);
    let mut backend = RealProcessBackend::new(sh_spec("sleep 30", dir.path().to_path_buf()), tx);

    let pid = expect_spawned(&mut backend).await;

    backend.terminate(pid).await?;
    match next_event(&mut rx).await {
        SessionEvent::ProcessExited { pid: exited, code } => {
            assert_eq!(exited, pid);
            assert_eq!(code, None, "killed by a signal, no exit code");
        }
        other => panic!("expected ProcessExited, got {other:?}"),
    }

    backend.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn self_exit_is_reported_with_code() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(16);
    let mut backend = RealProcessBackend::new(
        sh_spec("echo window closed; exit 3", dir.path().to_path_buf()),
        tx,
    );

    let pid = expect_spawned(&mut backend).await;

    assert_eq!(
        next_event(&mut rx).await,
        SessionEvent::ProcessExited { pid, code: Some(3) }
    );
    Ok(())
}

#[tokio::test]
async fn launch_uses_cwd_env_and_entry() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("marker"), "x")?;

    let mut spec = sh_spec(
        r#"test -f marker && test "$DEVLAUNCH_MODE" = dev && test "$0" = "$(pwd -P)/dist/main.js""#,
        dir.path().canonicalize()?,
    );
    spec.env.insert("DEVLAUNCH_MODE".to_string(), "dev".to_string());

    let (tx, mut rx) = mpsc::channel(16);
    let mut backend = RealProcessBackend::new(spec, tx);

    let pid = expect_spawned(&mut backend).await;
    assert_eq!(
        next_event(&mut rx).await,
        SessionEvent::ProcessExited { pid, code: Some(0) }
    );
    Ok(())
}

#[tokio::test]
async fn missing_executable_reports_launch_failure() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let spec = AppLaunchSpec {
        executable: dir.path().join("node_modules/.bin/electron"),
        ..sh_spec("true", dir.path().to_path_buf())
    };

    let (tx, mut rx) = mpsc::channel(16);
    let mut backend = RealProcessBackend::new(spec, tx);

    // The failure is an outcome, not an error of the call itself.
    match backend.launch().await? {
        LaunchOutcome::Failed { reason } => assert!(reason.contains("spawning"), "{reason}"),
        other => panic!("expected a launch failure, got {other:?}"),
    }
    assert!(
        rx.try_recv().is_err(),
        "a failed launch sends nothing to the session channel"
    );
    Ok(())
}

#[tokio::test]
async fn terminate_unknown_pid_is_an_error() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let (tx, _rx) = mpsc::channel(16);
    let mut backend = RealProcessBackend::new(sh_spec("true", dir.path().to_path_buf()), tx);

    assert!(backend.terminate(4_000_000).await.is_err());
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_running_processes() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(16);
    let mut backend = RealProcessBackend::new(sh_spec("sleep 30", dir.path().to_path_buf()), tx);

    let first = expect_spawned(&mut backend).await;
    let second = expect_spawned(&mut backend).await;

    with_timeout(backend.shutdown()).await;

    let mut exited = Vec::new();
    for _ in 0..2 {
        match next_event(&mut rx).await {
            SessionEvent::ProcessExited { pid, .. } => exited.push(pid),
            other => panic!("expected ProcessExited, got {other:?}"),
        }
    }
    exited.sort_unstable();
    let mut expected = vec![first, second];
    expected.sort_unstable();
    assert_eq!(exited, expected);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runtime_launches_and_stops_with_full_event_channel() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let (tx, rx) = mpsc::channel(64);

    // Readiness first, then a queue with no free slot when `Launch` runs.
    tx.try_send(main_build(true))?;
    tx.try_send(SessionEvent::ServingReady)?;
    let compiling = SessionEvent::BuildStarted {
        role: WatcherRole::Renderer,
    };
    for _ in 0..64 {
        if tx.try_send(compiling.clone()).is_err() {
            break;
        }
    }

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let tx = tx.clone();
            let event = compiling.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    if tx.send(event.clone()).await.is_err() {
                        break;
                    }
                }
            })
        })
        .collect();

    let backend = RealProcessBackend::new(sh_spec("sleep 30", dir.path().to_path_buf()), tx.clone());
    let runtime = Runtime::new(SessionCore::new(Duration::from_secs(5)), rx, backend);
    let handle = tokio::spawn(runtime.run());

    with_timeout(tx.send(SessionEvent::ShutdownRequested)).await?;
    let end = with_timeout(handle).await??;
    assert_eq!(end, SessionEnd::Shutdown);

    for producer in producers {
        producer.await?;
    }
    Ok(())
}
