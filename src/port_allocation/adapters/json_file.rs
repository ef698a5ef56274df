//! Port registry stored as a JSON file under the manager home.

use crate::config::ManagerPaths;
use crate::port_allocation::{
    domain::PortRegistryDocument,
    ports::{PortRegistryStore, PortRegistryStoreError, PortRegistryStoreResult},
};
use crate::storage::{DocumentLease, JsonDocumentFile};
use camino::{Utf8Path, Utf8PathBuf};

/// File-backed port registry (`port_registry.json`).
#[derive(Debug, Clone)]
pub struct JsonFilePortRegistry {
    file: JsonDocumentFile,
}

impl JsonFilePortRegistry {
    /// Creates a registry stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            file: JsonDocumentFile::new(path),
        }
    }

    /// Creates a registry at the default location for `paths`.
    #[must_use]
    pub fn for_paths(paths: &ManagerPaths) -> Self {
        Self::new(paths.port_registry_path())
    }

    /// Returns the registry file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.file.path()
    }
}

impl PortRegistryStore for JsonFilePortRegistry {
    fn load(&self) -> PortRegistryStoreResult<PortRegistryDocument> {
        if let Some(document) = self
            .file
            .read::<PortRegistryDocument>()
            .map_err(PortRegistryStoreError::persistence)?
        {
            return Ok(document);
        }

        let empty = PortRegistryDocument::new();
        self.file
            .create_if_missing(&empty)
            .map_err(PortRegistryStoreError::persistence)?;
        Ok(empty)
    }

    fn save(&self, document: &PortRegistryDocument) -> PortRegistryStoreResult<()> {
        self.file
            .write(document)
            .map_err(PortRegistryStoreError::persistence)
    }

    fn lock(&self) -> PortRegistryStoreResult<DocumentLease> {
        self.file
            .lock_exclusive()
            .map_err(PortRegistryStoreError::lock)
    }
}
