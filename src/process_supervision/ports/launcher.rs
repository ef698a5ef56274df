//! Process launching and control ports.

use crate::process_supervision::domain::{LaunchSpec, ProcessError};
use async_trait::async_trait;
use std::time::Duration;

/// Result type for process adapter operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Spawns server processes.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Spawns the process described by `spec` with stdout and stderr merged
    /// into one line stream.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] when the process cannot be started.
    async fn launch(&self, spec: &LaunchSpec) -> ProcessResult<Box<dyn ManagedProcess>>;
}

/// Handle to one running server process.
///
/// Dropping the handle must not leave the process running.
#[async_trait]
pub trait ManagedProcess: Send {
    /// Returns the operating-system process identifier, when known.
    fn id(&self) -> Option<u32>;

    /// Returns whether the process has not exited yet.
    fn is_alive(&mut self) -> bool;

    /// Returns the next complete output line if one is ready, without
    /// waiting.
    fn try_read_line(&mut self) -> Option<String>;

    /// Requests a graceful exit.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Signal`] when the request cannot be
    /// delivered.
    async fn terminate(&mut self) -> ProcessResult<()>;

    /// Forces the process to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Signal`] when the request cannot be
    /// delivered.
    async fn kill(&mut self) -> ProcessResult<()>;

    /// Waits up to `timeout` for the process to exit and reports whether it
    /// did.
    async fn wait_for_exit(&mut self, timeout: Duration) -> bool;

    /// Collects output still in flight after exit, waiting at most
    /// `timeout`.
    async fn collect_remaining_output(&mut self, timeout: Duration) -> Vec<String>;
}
