//! Adapter implementations for process supervision ports.

mod allocator;
pub mod memory;
mod process;
mod tracing_observer;

pub use process::TokioProcessLauncher;
pub use tracing_observer::TracingObserver;
