//! Orchestration services for port allocation.

mod allocator;

pub use allocator::PortAllocator;
