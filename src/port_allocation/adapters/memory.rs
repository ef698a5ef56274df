//! In-memory adapters for port allocation tests.

use crate::port_allocation::{
    domain::PortRegistryDocument,
    ports::{PortProbe, PortRegistryStore, PortRegistryStoreError, PortRegistryStoreResult},
};
use crate::storage::DocumentLease;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory port registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPortRegistry {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    document: PortRegistryDocument,
    unavailable: bool,
}

impl InMemoryPortRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with `document`.
    #[must_use]
    pub fn with_document(document: PortRegistryDocument) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryRegistryState {
                document,
                unavailable: false,
            })),
        }
    }

    /// Returns a copy of the stored registry.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn snapshot(&self) -> PortRegistryStoreResult<PortRegistryDocument> {
        let state = self.state.read().map_err(|err| {
            PortRegistryStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.document.clone())
    }

    /// Makes every subsequent load and save fail until reset.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn set_unavailable(&self, unavailable: bool) -> PortRegistryStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            PortRegistryStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.unavailable = unavailable;
        Ok(())
    }
}

fn unavailable_error() -> PortRegistryStoreError {
    PortRegistryStoreError::persistence(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "registry unavailable",
    ))
}

impl PortRegistryStore for InMemoryPortRegistry {
    fn load(&self) -> PortRegistryStoreResult<PortRegistryDocument> {
        let state = self.state.read().map_err(|err| {
            PortRegistryStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if state.unavailable {
            return Err(unavailable_error());
        }
        Ok(state.document.clone())
    }

    fn save(&self, document: &PortRegistryDocument) -> PortRegistryStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            PortRegistryStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if state.unavailable {
            return Err(unavailable_error());
        }
        state.document = document.clone();
        Ok(())
    }

    fn lock(&self) -> PortRegistryStoreResult<DocumentLease> {
        Ok(DocumentLease::unguarded())
    }
}

/// Probe that reports a fixed set of ports as taken.
#[derive(Debug, Clone, Default)]
pub struct StaticPortProbe {
    busy: Arc<RwLock<BTreeSet<u16>>>,
}

impl StaticPortProbe {
    /// Creates a probe where every port is free.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a probe with `ports` already taken.
    #[must_use]
    pub fn with_busy(ports: impl IntoIterator<Item = u16>) -> Self {
        Self {
            busy: Arc::new(RwLock::new(ports.into_iter().collect())),
        }
    }

    /// Marks `port` as taken.
    pub fn occupy(&self, port: u16) {
        self.busy
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(port);
    }
}

#[async_trait]
impl PortProbe for StaticPortProbe {
    async fn is_in_use(&self, port: u16) -> bool {
        self.busy
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&port)
    }
}
