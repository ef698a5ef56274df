//! In-memory instance registry for tests and embedding.

use crate::instance::InstanceName;
use crate::server_config::{
    domain::ServerConfigDocument,
    ports::{InstanceRegistry, InstanceRegistryError, InstanceRegistryResult},
};
use crate::storage::DocumentLease;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory instance registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInstanceRegistry {
    state: Arc<RwLock<BTreeMap<InstanceName, Option<ServerConfigDocument>>>>,
}

impl InMemoryInstanceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `instance` without a configuration document.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn register(&self, instance: InstanceName) -> InstanceRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            InstanceRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.entry(instance).or_insert(None);
        Ok(())
    }
}

impl InstanceRegistry for InMemoryInstanceRegistry {
    fn list_instances(&self) -> InstanceRegistryResult<Vec<InstanceName>> {
        let state = self.state.read().map_err(|err| {
            InstanceRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.keys().cloned().collect())
    }

    fn load_server_config(
        &self,
        instance: &InstanceName,
    ) -> InstanceRegistryResult<Option<ServerConfigDocument>> {
        let state = self.state.read().map_err(|err| {
            InstanceRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.get(instance).cloned().flatten())
    }

    fn save_server_config(
        &self,
        instance: &InstanceName,
        document: &ServerConfigDocument,
    ) -> InstanceRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            InstanceRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.insert(instance.clone(), Some(document.clone()));
        Ok(())
    }

    fn lock_server_config(&self, _instance: &InstanceName) -> InstanceRegistryResult<DocumentLease> {
        Ok(DocumentLease::unguarded())
    }
}
