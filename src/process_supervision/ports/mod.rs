//! Port contracts for process supervision.

mod launcher;
mod observer;
mod tool_port;

pub use launcher::{ManagedProcess, ProcessLauncher, ProcessResult};
pub use observer::SupervisorObserver;
pub use tool_port::ToolPortSource;
