//! Port contracts for instance discovery and configuration persistence.

mod registry;

pub use registry::{InstanceRegistry, InstanceRegistryError, InstanceRegistryResult};
