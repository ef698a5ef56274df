//! Orchestration services for process supervision.

mod supervisor;

pub use supervisor::{ProcessSupervisor, StopTimeouts};
