//! Tool port lookup port.

use crate::instance::InstanceName;
use crate::port_allocation::domain::PortAllocationResult;
use async_trait::async_trait;

/// Resolves the port a server listens on when its arguments do not say.
#[async_trait]
pub trait ToolPortSource: Send + Sync {
    /// Returns the port reserved for `server` in the range of `instance`.
    ///
    /// # Errors
    ///
    /// Returns port allocation errors when no range can be assigned.
    async fn tool_port(&self, instance: &InstanceName, server: &str) -> PortAllocationResult<u16>;
}
