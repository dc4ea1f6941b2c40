#![allow(dead_code)]

pub use devlaunch_test_utils::builders;
pub use devlaunch_test_utils::{init_tracing, with_timeout};

use devlaunch::engine::SessionEvent;
use devlaunch::types::{BuildEvent, WatcherRole};

/// A finished main-process build.
pub fn main_build(success: bool) -> SessionEvent {
    build(WatcherRole::Main, success)
}

/// A finished renderer build.
pub fn renderer_build(success: bool) -> SessionEvent {
    build(WatcherRole::Renderer, success)
}

pub fn build(role: WatcherRole, success: bool) -> SessionEvent {
    let event = if success {
        BuildEvent::success(vec![format!("{role} bundle written")])
    } else {
        BuildEvent::failure(vec![format!("ERROR in {role} entry: Unexpected token")])
    };
    SessionEvent::Build { role, event }
}
