//! Domain model for port ranges and the durable port registry.
//!
//! The domain knows the range arithmetic, the tool offset table and the
//! registry document shape. Probing the host and touching the filesystem
//! remain outside this boundary.

mod error;
mod port;
mod registry;
mod tool;

pub use error::{PortAllocationError, PortAllocationResult};
pub use port::{
    BasePort, MCP_BASE_PORT, MCP_PORT_RANGE, PROBE_ATTEMPTS, PROBE_OFFSETS, candidate_bases,
};
pub use registry::PortRegistryDocument;
pub use tool::{DEFAULT_TOOL_OFFSET, KnownTool, tool_port_offset};
