// src/watch/diagnostics.rs

use std::collections::VecDeque;

/// Most recent compiler output lines kept for one build event.
pub const MAX_DIAGNOSTIC_LINES: usize = 200;

/// Bounded buffer of output lines between two build events; the oldest
/// lines are dropped first.
#[derive(Debug, Clone)]
pub struct DiagnosticBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl DiagnosticBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Hand out the collected lines and start over.
    pub fn take(&mut self) -> Vec<String> {
        self.lines.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for DiagnosticBuffer {
    fn default() -> Self {
        Self::new(MAX_DIAGNOSTIC_LINES)
    }
}
