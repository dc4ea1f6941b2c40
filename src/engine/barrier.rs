// src/engine/barrier.rs

use tracing::debug;

use crate::types::WatcherRole;

/// Startup barrier over the two watcher readiness signals.
///
/// Releases exactly once, on the call that completes the pair, regardless of
/// the order the signals arrive in. Repeated signals are ignored.
#[derive(Debug, Default)]
pub struct ReadinessBarrier {
    renderer_ready: bool,
    main_ready: bool,
    released: bool,
}

impl ReadinessBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record readiness for `role`. Returns `true` only for the call that
    /// releases the barrier.
    pub fn mark_ready(&mut self, role: WatcherRole) -> bool {
        match role {
            WatcherRole::Renderer => self.renderer_ready = true,
            WatcherRole::Main => self.main_ready = true,
        }

        if self.released || !(self.renderer_ready && self.main_ready) {
            debug!(%role, released = self.released, "readiness recorded");
            return false;
        }

        self.released = true;
        true
    }

    pub fn is_ready(&self, role: WatcherRole) -> bool {
        match role {
            WatcherRole::Renderer => self.renderer_ready,
            WatcherRole::Main => self.main_ready,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
