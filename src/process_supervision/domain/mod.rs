//! Domain model for supervised helper processes.

mod error;
mod key;
mod launch;
mod log;
mod outcome;

pub use error::{ProcessError, SupervisorError, SupervisorResult};
pub use key::ServerKey;
pub use launch::{CLAUDE_INSTANCE_ENV, LaunchSpec, MCP_PORT_ENV, MCP_SERVER_PORT_ENV};
pub use log::{CapturedLog, LOG_CAPACITY};
pub use outcome::{BatchOutcome, ServerStatus, StartOutcome, StopOutcome};
