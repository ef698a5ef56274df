//! Results reported by supervisor operations.

use super::SupervisorError;
use chrono::{DateTime, Utc};

/// Result of a successful start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new process was launched.
    Started {
        /// Operating-system process identifier, when known.
        pid: Option<u32>,
        /// Port handed to the process.
        port: u16,
    },
    /// A live process was already tracked; nothing was launched.
    AlreadyRunning {
        /// Identifier of the existing process.
        pid: Option<u32>,
    },
}

/// Result of a successful stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The process exited after the graceful request.
    Terminated,
    /// The process had to be killed.
    Killed,
    /// The process had already exited.
    AlreadyExited,
}

/// Per-server results of a best-effort batch operation.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Servers handled successfully.
    pub succeeded: Vec<String>,
    /// Servers that failed, with the reason.
    pub failed: Vec<(String, SupervisorError)>,
}

impl BatchOutcome {
    /// Returns whether every server succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record<T>(&mut self, server: String, result: Result<T, SupervisorError>) {
        match result {
            Ok(_) => self.succeeded.push(server),
            Err(err) => self.failed.push((server, err)),
        }
    }
}

/// Status row for one configured server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    /// Server name.
    pub name: String,
    /// Whether a live process is tracked.
    pub running: bool,
    /// Effective port from the arguments, or the tool port when unset.
    pub port: u16,
    /// Whether the server starts with its instance.
    pub auto_start: bool,
    /// Process identifier while running.
    pub pid: Option<u32>,
    /// Start time while running.
    pub started_at: Option<DateTime<Utc>>,
}
