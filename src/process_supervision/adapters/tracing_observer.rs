//! Observer forwarding supervisor events to `tracing`.

use crate::process_supervision::{domain::ServerKey, ports::SupervisorObserver};
use tracing::info;

/// Emits one `tracing` event per supervisor event.
///
/// Output lines use the `vauban::output` target so they can be filtered
/// separately from lifecycle events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SupervisorObserver for TracingObserver {
    fn server_started(&self, key: &ServerKey, pid: Option<u32>) {
        info!(instance = %key.instance(), server = key.server(), pid, "server started");
    }

    fn server_stopped(&self, key: &ServerKey) {
        info!(instance = %key.instance(), server = key.server(), "server stopped");
    }

    fn server_output(&self, key: &ServerKey, line: &str) {
        info!(
            target: "vauban::output",
            instance = %key.instance(),
            server = key.server(),
            "{line}"
        );
    }
}
