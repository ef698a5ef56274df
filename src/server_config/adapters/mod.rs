//! Adapter implementations for the instance registry port.

mod file;
pub mod memory;

pub use file::FileInstanceRegistry;
