//! Loopback TCP connect probe.

use crate::port_allocation::ports::PortProbe;
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpSocket;
use tracing::debug;

/// Time allowed for one connect attempt.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Probes ports by attempting a TCP connection on the loopback interface.
///
/// A completed connection means the port is taken. Refusals, timeouts and
/// other connect errors mean it is free. When no socket can be created the
/// port is reported as taken.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnectProbe {
    host: Ipv4Addr,
    timeout: Duration,
}

impl Default for TcpConnectProbe {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::LOCALHOST,
            timeout: PROBE_TIMEOUT,
        }
    }
}

impl TcpConnectProbe {
    /// Creates a loopback probe with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the connect timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PortProbe for TcpConnectProbe {
    async fn is_in_use(&self, port: u16) -> bool {
        let socket = match TcpSocket::new_v4() {
            Ok(socket) => socket,
            Err(err) => {
                debug!(port, error = %err, "probe socket unavailable, treating port as taken");
                return true;
            }
        };

        let address = SocketAddr::from((self.host, port));
        match tokio::time::timeout(self.timeout, socket.connect(address)).await {
            Ok(Ok(_stream)) => {
                debug!(port, "probe connected");
                true
            }
            Ok(Err(_)) | Err(_) => false,
        }
    }
}
