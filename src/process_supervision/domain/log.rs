//! Bounded capture of process output.

use std::collections::VecDeque;

/// Maximum number of lines kept per server.
pub const LOG_CAPACITY: usize = 1000;

/// Most recent output lines of one server, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for CapturedLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl CapturedLog {
    /// Creates an empty log holding at most [`LOG_CAPACITY`] lines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log holding at most `capacity` lines.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(LOG_CAPACITY)),
            capacity,
        }
    }

    /// Appends a line, evicting the oldest once full.
    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Returns the captured lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    /// Returns the number of captured lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
