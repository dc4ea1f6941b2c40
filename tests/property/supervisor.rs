use std::collections::VecDeque;
use std::time::Duration;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use devlaunch::engine::{
    ProcessState, SessionCommand, SessionCore, SessionEvent, SessionExit,
};
use devlaunch::types::{BuildEvent, WatcherRole};

/// Something the outside world can do next.
#[derive(Debug, Clone, Copy)]
enum Action {
    MainBuild(bool),
    RendererBuild(bool),
    ServingReady,
    /// The outstanding launch comes up.
    SpawnLaunched,
    /// The outstanding launch fails.
    FailLaunch,
    /// The oldest terminated process finally exits.
    ExitTerminated,
    /// The user closes the running application.
    QuitApp,
    /// The armed restart window runs out.
    WindowElapsed,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => any::<bool>().prop_map(Action::MainBuild),
        1 => any::<bool>().prop_map(Action::RendererBuild),
        2 => Just(Action::ServingReady),
        4 => Just(Action::SpawnLaunched),
        1 => Just(Action::FailLaunch),
        3 => Just(Action::ExitTerminated),
        1 => Just(Action::QuitApp),
        1 => Just(Action::WindowElapsed),
    ]
}

/// A process backend simulated in lock-step with the core.
struct Sim {
    core: SessionCore,
    launch_outstanding: bool,
    launches: usize,
    next_pid: u32,
    live: Vec<u32>,
    terminating: VecDeque<u32>,
    armed: Option<u64>,
    main_ready: bool,
    serving_ready: bool,
}

impl Sim {
    fn new() -> Self {
        Self {
            core: SessionCore::new(Duration::from_secs(5)),
            launch_outstanding: false,
            launches: 0,
            next_pid: 1000,
            live: Vec::new(),
            terminating: VecDeque::new(),
            armed: None,
            main_ready: false,
            serving_ready: false,
        }
    }

    fn released(&self) -> bool {
        self.main_ready && self.serving_ready
    }

    /// Returns `Ok(false)` once the session has ended.
    fn apply(&mut self, action: Action) -> Result<bool, TestCaseError> {
        let was_released = self.released();

        let event = match action {
            Action::MainBuild(success) => {
                self.main_ready |= success;
                build(WatcherRole::Main, success)
            }
            Action::RendererBuild(success) => build(WatcherRole::Renderer, success),
            Action::ServingReady => {
                self.serving_ready = true;
                SessionEvent::ServingReady
            }
            Action::SpawnLaunched => {
                if !self.launch_outstanding {
                    return Ok(true);
                }
                self.launch_outstanding = false;
                let pid = self.next_pid;
                self.next_pid += 1;
                self.live.push(pid);
                SessionEvent::ProcessSpawned { pid }
            }
            Action::FailLaunch => {
                if !self.launch_outstanding {
                    return Ok(true);
                }
                let step = self.core.step(SessionEvent::LaunchFailed {
                    reason: "boom".to_string(),
                });
                prop_assert!(matches!(step.exit, Some(SessionExit::LaunchFailed { .. })), "expected LaunchFailed exit, got {:?}", step.exit);
                return Ok(false);
            }
            Action::ExitTerminated => {
                let Some(pid) = self.terminating.pop_front() else {
                    return Ok(true);
                };
                self.live.retain(|p| *p != pid);
                let step = self.core.step(SessionEvent::ProcessExited { pid, code: None });
                prop_assert!(step.keep_running(), "exit of terminated pid {} ended session", pid);
                prop_assert!(step.commands.is_empty());
                return Ok(true);
            }
            Action::QuitApp => {
                let ProcessState::Running { pid } = self.core.process_state() else {
                    return Ok(true);
                };
                let step = self.core.step(SessionEvent::ProcessExited { pid, code: Some(0) });
                prop_assert_eq!(step.exit, Some(SessionExit::AppExited { pid, code: Some(0) }));
                return Ok(false);
            }
            Action::WindowElapsed => {
                let Some(generation) = self.armed.take() else {
                    return Ok(true);
                };
                let restarting =
                    matches!(self.core.process_state(), ProcessState::Restarting { .. });
                let step = self.core.step(SessionEvent::RestartWindowElapsed { generation });
                if restarting {
                    prop_assert!(matches!(step.exit, Some(SessionExit::RestartStalled { .. })), "expected RestartStalled exit, got {:?}", step.exit);
                    return Ok(false);
                }
                prop_assert!(step.keep_running());
                return Ok(true);
            }
        };

        let step = self.core.step(event);
        prop_assert!(step.keep_running(), "unexpected exit {:?}", step.exit);

        let launched_now = step
            .commands
            .iter()
            .any(|c| *c == SessionCommand::Launch);
        if !was_released && self.released() {
            prop_assert!(launched_now, "barrier released without a launch");
        }

        for command in step.commands {
            match command {
                SessionCommand::Launch => {
                    prop_assert!(self.released(), "launch before both builds were ready");
                    prop_assert!(!self.launch_outstanding, "two launches in flight");
                    self.launch_outstanding = true;
                    self.launches += 1;
                }
                SessionCommand::Terminate { pid } => {
                    prop_assert!(self.live.contains(&pid), "terminate of unknown pid {}", pid);
                    prop_assert!(!self.terminating.contains(&pid), "pid {} terminated twice", pid);
                    self.terminating.push_back(pid);
                }
                SessionCommand::ArmRestartWindow { generation, .. } => {
                    self.armed = Some(generation);
                }
                SessionCommand::DisarmRestartWindow => {
                    self.armed = None;
                }
            }
        }

        Ok(true)
    }
}

fn build(role: WatcherRole, success: bool) -> SessionEvent {
    let event = if success {
        BuildEvent::success(Vec::new())
    } else {
        BuildEvent::failure(Vec::new())
    };
    SessionEvent::Build { role, event }
}

proptest! {
    #[test]
    fn supervisor_keeps_one_process_in_flight(
        actions in proptest::collection::vec(action_strategy(), 1..200)
    ) {
        let mut sim = Sim::new();

        for action in actions {
            if !sim.apply(action)? {
                break;
            }

            // A live process that is not being replaced is the tracked one.
            let untracked: Vec<u32> = sim
                .live
                .iter()
                .copied()
                .filter(|pid| !sim.terminating.contains(pid))
                .collect();
            prop_assert!(untracked.len() <= 1, "several untracked processes: {:?}", untracked);
            if let ProcessState::Running { pid } = sim.core.process_state() {
                prop_assert_eq!(untracked, vec![pid]);
            }
        }

        if sim.launches > 0 {
            prop_assert!(sim.released());
        }
    }

    #[test]
    fn first_launch_waits_for_both_signals(
        main_results in proptest::collection::vec(any::<bool>(), 0..10),
        serving_first in any::<bool>(),
    ) {
        let mut core = SessionCore::new(Duration::from_secs(5));
        let mut launches = 0;

        if serving_first {
            launches += count_launches(&core.step(SessionEvent::ServingReady).commands);
        }
        for success in &main_results {
            launches += count_launches(&core.step(build(WatcherRole::Main, *success)).commands);
        }
        if !serving_first {
            launches += count_launches(&core.step(SessionEvent::ServingReady).commands);
        }

        let main_succeeded = main_results.iter().any(|ok| *ok);
        prop_assert_eq!(launches, usize::from(main_succeeded));
    }
}

fn count_launches(commands: &[SessionCommand]) -> usize {
    commands
        .iter()
        .filter(|c| **c == SessionCommand::Launch)
        .count()
}
