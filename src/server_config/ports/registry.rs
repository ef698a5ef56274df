//! Instance registry port.

use crate::instance::InstanceName;
use crate::server_config::domain::ServerConfigDocument;
use crate::storage::DocumentLease;
use std::sync::Arc;
use thiserror::Error;

/// Result type for instance registry operations.
pub type InstanceRegistryResult<T> = Result<T, InstanceRegistryError>;

/// Access to known instances and their server configuration documents.
pub trait InstanceRegistry: Send + Sync {
    /// Lists registered instance names.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceRegistryError::Persistence`] when the registry
    /// cannot be read.
    fn list_instances(&self) -> InstanceRegistryResult<Vec<InstanceName>>;

    /// Loads the configuration document of `instance`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceRegistryError::Persistence`] when the document
    /// exists but cannot be read or decoded.
    fn load_server_config(
        &self,
        instance: &InstanceName,
    ) -> InstanceRegistryResult<Option<ServerConfigDocument>>;

    /// Writes the configuration document of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceRegistryError::Persistence`] when the document
    /// cannot be written.
    fn save_server_config(
        &self,
        instance: &InstanceName,
        document: &ServerConfigDocument,
    ) -> InstanceRegistryResult<()>;

    /// Takes exclusive access to the document of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceRegistryError::Lock`] when the lock cannot be
    /// acquired.
    fn lock_server_config(&self, instance: &InstanceName) -> InstanceRegistryResult<DocumentLease>;
}

/// Errors returned by instance registry implementations.
#[derive(Debug, Clone, Error)]
pub enum InstanceRegistryError {
    /// Exclusive access could not be acquired.
    #[error("instance configuration lock error: {0}")]
    Lock(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("instance registry persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl InstanceRegistryError {
    /// Wraps a locking failure.
    pub fn lock(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lock(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
