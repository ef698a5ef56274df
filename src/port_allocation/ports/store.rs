//! Persistence port for the port registry.

use crate::port_allocation::domain::PortRegistryDocument;
use crate::storage::DocumentLease;
use std::sync::Arc;
use thiserror::Error;

/// Result type for port registry store operations.
pub type PortRegistryStoreResult<T> = Result<T, PortRegistryStoreError>;

/// Persistence contract for the instance to base-port registry.
pub trait PortRegistryStore: Send + Sync {
    /// Loads the current registry, creating an empty one when none exists.
    ///
    /// # Errors
    ///
    /// Returns [`PortRegistryStoreError::Persistence`] when the registry
    /// cannot be read or decoded.
    fn load(&self) -> PortRegistryStoreResult<PortRegistryDocument>;

    /// Replaces the stored registry.
    ///
    /// # Errors
    ///
    /// Returns [`PortRegistryStoreError::Persistence`] when the registry
    /// cannot be written.
    fn save(&self, document: &PortRegistryDocument) -> PortRegistryStoreResult<()>;

    /// Takes exclusive access for a read-modify-write sequence.
    ///
    /// # Errors
    ///
    /// Returns [`PortRegistryStoreError::Lock`] when the lock cannot be
    /// acquired.
    fn lock(&self) -> PortRegistryStoreResult<DocumentLease>;
}

/// Errors returned by port registry stores.
#[derive(Debug, Clone, Error)]
pub enum PortRegistryStoreError {
    /// Exclusive access could not be acquired.
    #[error("port registry lock error: {0}")]
    Lock(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("port registry persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PortRegistryStoreError {
    /// Wraps a locking failure.
    pub fn lock(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lock(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
