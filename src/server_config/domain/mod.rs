//! Domain model for server configuration documents.

mod document;
mod launch;

pub use document::{BASELINE_PRELOAD_SCRIPT, ServerConfigDocument};
pub use launch::{DEFAULT_COMMAND, PORT_FLAG, PortArgument, ServerLaunchConfig};
