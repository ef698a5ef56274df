//! Supervisor event observer port.

use crate::process_supervision::domain::ServerKey;

/// Receives supervisor lifecycle and output events.
///
/// Callbacks run synchronously after the supervisor has released its
/// internal state, so implementations may call back into the supervisor.
pub trait SupervisorObserver: Send + Sync {
    /// A server process was launched.
    fn server_started(&self, _key: &ServerKey, _pid: Option<u32>) {}

    /// A server process was stopped or found to have exited.
    fn server_stopped(&self, _key: &ServerKey) {}

    /// A server process printed a line.
    fn server_output(&self, _key: &ServerKey, _line: &str) {}
}
