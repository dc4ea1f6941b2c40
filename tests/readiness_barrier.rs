// tests/readiness_barrier.rs

mod common;
use crate::common::{init_tracing, main_build, renderer_build};

use std::time::Duration;

use devlaunch::engine::{
    ProcessState, ReadinessBarrier, SessionCommand, SessionCore, SessionEvent, SessionExit,
};
use devlaunch::types::WatcherRole;

/// Feed events and collect every command the core emits.
fn drive(core: &mut SessionCore, events: Vec<SessionEvent>) -> Vec<SessionCommand> {
    let mut commands = Vec::new();
    for event in events {
        let step = core.step(event);
        assert!(step.keep_running(), "session ended unexpectedly: {:?}", step.exit);
        commands.extend(step.commands);
    }
    commands
}

fn launches(commands: &[SessionCommand]) -> usize {
    commands
        .iter()
        .filter(|c| **c == SessionCommand::Launch)
        .count()
}

#[test]
fn barrier_releases_once_in_either_order() {
    for order in [
        [WatcherRole::Renderer, WatcherRole::Main],
        [WatcherRole::Main, WatcherRole::Renderer],
    ] {
        let mut barrier = ReadinessBarrier::new();
        assert!(!barrier.mark_ready(order[0]));
        assert!(!barrier.is_released());
        assert!(barrier.mark_ready(order[1]));
        assert!(barrier.is_released());

        // Repeated signals never release again.
        assert!(!barrier.mark_ready(order[0]));
        assert!(!barrier.mark_ready(order[1]));
    }
}

#[test]
fn main_then_renderer_launches_once() {
    init_tracing();
    let mut core = SessionCore::new(Duration::from_secs(5));

    let commands = drive(&mut core, vec![main_build(true)]);
    assert!(commands.is_empty(), "no launch before the renderer is ready");
    assert_eq!(core.process_state(), ProcessState::Idle);

    let commands = drive(&mut core, vec![SessionEvent::ServingReady]);
    assert_eq!(commands, vec![SessionCommand::Launch]);
    assert_eq!(core.process_state(), ProcessState::Launching);
}

#[test]
fn renderer_then_main_launches_once() {
    init_tracing();
    let mut core = SessionCore::new(Duration::from_secs(5));

    let commands = drive(
        &mut core,
        vec![renderer_build(true), SessionEvent::ServingReady],
    );
    assert!(commands.is_empty());

    let commands = drive(&mut core, vec![main_build(true)]);
    assert_eq!(commands, vec![SessionCommand::Launch]);
}

#[test]
fn renderer_compile_alone_is_not_readiness() {
    init_tracing();
    let mut core = SessionCore::new(Duration::from_secs(5));

    let commands = drive(
        &mut core,
        vec![renderer_build(true), renderer_build(true), main_build(true)],
    );

    assert!(commands.is_empty(), "renderer must wait for ServingReady");
    assert!(!core.is_ready(WatcherRole::Renderer));
    assert!(core.is_ready(WatcherRole::Main));
}

#[test]
fn failed_main_builds_do_not_make_main_ready() {
    init_tracing();
    let mut core = SessionCore::new(Duration::from_secs(5));

    let commands = drive(
        &mut core,
        vec![
            SessionEvent::ServingReady,
            main_build(false),
            main_build(false),
        ],
    );
    assert!(commands.is_empty());
    assert!(!core.is_ready(WatcherRole::Main));

    let commands = drive(&mut core, vec![main_build(true)]);
    assert_eq!(launches(&commands), 1);
}

#[test]
fn extra_signals_before_spawn_do_not_launch_twice() {
    init_tracing();
    let mut core = SessionCore::new(Duration::from_secs(5));

    let commands = drive(
        &mut core,
        vec![
            main_build(true),
            SessionEvent::ServingReady,
            SessionEvent::ServingReady,
            main_build(true),
        ],
    );

    // The success after the launch request is held back, not launched.
    assert_eq!(launches(&commands), 1);
    assert!(core.has_pending_restart());
}

#[test]
fn watcher_failure_before_ready_aborts_without_launch() {
    init_tracing();
    let mut core = SessionCore::new(Duration::from_secs(5));

    let commands = drive(&mut core, vec![SessionEvent::ServingReady]);
    assert!(commands.is_empty());

    let step = core.step(SessionEvent::WatcherFailed {
        role: WatcherRole::Main,
        reason: "watcher command exited (exit status: 1)".to_string(),
    });

    assert!(step.commands.is_empty(), "no launch may be attempted");
    assert_eq!(
        step.exit,
        Some(SessionExit::WatcherSetup {
            role: WatcherRole::Main,
            reason: "watcher command exited (exit status: 1)".to_string(),
        })
    );
    assert_eq!(core.process_state(), ProcessState::Stopped);
}

#[test]
fn watcher_failure_after_launch_is_a_crash() {
    init_tracing();
    let mut core = SessionCore::new(Duration::from_secs(5));

    drive(
        &mut core,
        vec![
            main_build(true),
            SessionEvent::ServingReady,
            SessionEvent::ProcessSpawned { pid: 7 },
        ],
    );

    let step = core.step(SessionEvent::WatcherFailed {
        role: WatcherRole::Renderer,
        reason: "dev server died".to_string(),
    });

    match step.exit {
        Some(SessionExit::WatcherCrashed { role, .. }) => assert_eq!(role, WatcherRole::Renderer),
        other => panic!("expected WatcherCrashed, got {other:?}"),
    }
    assert!(step.exit.as_ref().is_some_and(SessionExit::is_fatal));
}
