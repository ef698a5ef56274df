//! Port contracts for port allocation.

mod probe;
mod store;

pub use probe::PortProbe;
pub use store::{PortRegistryStore, PortRegistryStoreError, PortRegistryStoreResult};
