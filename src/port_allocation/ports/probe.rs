//! Availability probe port.

use async_trait::async_trait;

/// Decides whether a local TCP port is already taken.
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// Returns `true` when something accepts connections on `port`, or when
    /// the probe itself cannot be set up.
    async fn is_in_use(&self, port: u16) -> bool;
}
