//! Adapter implementations for port allocation ports.

mod json_file;
pub mod memory;
mod tcp;

pub use json_file::JsonFilePortRegistry;
pub use tcp::{PROBE_TIMEOUT, TcpConnectProbe};
