//! Port range allocation service.

use crate::instance::InstanceName;
use crate::port_allocation::{
    domain::{
        BasePort, MCP_BASE_PORT, PortAllocationError, PortAllocationResult, PortRegistryDocument,
        candidate_bases, tool_port_offset,
    },
    ports::{PortProbe, PortRegistryStore},
};
use crate::storage::DocumentLease;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Allocates and releases per-instance port ranges.
///
/// The registry is re-read on every call. Registry I/O failures are logged
/// and treated as an empty registry so that callers always get a port.
#[derive(Clone)]
pub struct PortAllocator<S, P>
where
    S: PortRegistryStore,
    P: PortProbe,
{
    store: Arc<S>,
    probe: Arc<P>,
}

impl<S, P> PortAllocator<S, P>
where
    S: PortRegistryStore,
    P: PortProbe,
{
    /// Creates an allocator over `store`, checking candidates with `probe`.
    #[must_use]
    pub const fn new(store: Arc<S>, probe: Arc<P>) -> Self {
        Self { store, probe }
    }

    /// Returns the base port of `instance`, allocating one when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PortAllocationError::RangeExhausted`] when a new range is
    /// needed and none fits in the port space.
    pub async fn get_base_port(&self, instance: &InstanceName) -> PortAllocationResult<BasePort> {
        if let Some(base) = self.load_registry().get(instance) {
            return Ok(base);
        }
        self.allocate_port_range(instance).await
    }

    /// Allocates a range for `instance`, or returns the one it already has.
    ///
    /// The first candidate sits one range above the highest allocation.
    /// Up to ten candidates are probed and the first one with every probe
    /// port free wins. When all are taken the first candidate is used
    /// without verification. The result is persisted before returning.
    ///
    /// Probing happens before the registry lease is taken, so the lease is
    /// never held across an await. When another allocation lands while
    /// probing and overlaps the chosen base, the first range above the new
    /// highest allocation is used unverified.
    ///
    /// # Errors
    ///
    /// Returns [`PortAllocationError::RangeExhausted`] when even the first
    /// candidate would leave the port space.
    pub async fn allocate_port_range(
        &self,
        instance: &InstanceName,
    ) -> PortAllocationResult<BasePort> {
        let snapshot = self.load_registry();
        if let Some(existing) = snapshot.get(instance) {
            return Ok(existing);
        }

        let candidates = candidate_bases(snapshot.highest());
        let first = first_candidate(instance, &snapshot, &candidates)?;
        let chosen = match self.first_free_candidate(&candidates).await {
            Some(base) => base,
            None => {
                warn!(
                    instance = %instance,
                    base = %first,
                    "every candidate range is in use, assigning first candidate unverified"
                );
                first
            }
        };

        self.commit(instance, chosen)
    }
    /// Returns the port reserved for `tool_id` inside the range of
    /// `instance`, allocating the range when needed.
    ///
    /// # Errors
    ///
    /// Returns [`PortAllocationError::RangeExhausted`] when allocation fails
    /// or [`PortAllocationError::PortOutOfRange`] when a registered base is
    /// too close to the end of the port space.
    pub async fn get_tool_port(
        &self,
        instance: &InstanceName,
        tool_id: &str,
    ) -> PortAllocationResult<u16> {
        let base = self.get_base_port(instance).await?;
        let offset = tool_port_offset(tool_id);
        base.port_at(offset)
            .ok_or_else(|| PortAllocationError::PortOutOfRange {
                instance: instance.clone(),
                base,
                offset,
            })
    }

    /// Removes the range of `instance`, reporting whether one existed.
    ///
    /// Processes already listening inside the range are left alone.
    pub fn release_port_range(&self, instance: &InstanceName) -> bool {
        let _lease = self.acquire_lease();
        let mut registry = self.load_registry();
        let Some(base) = registry.remove(instance) else {
            return false;
        };
        self.persist(&registry);
        info!(instance = %instance, base = %base, "released port range");
        true
    }

    /// Returns the current registry contents.
    #[must_use]
    pub fn allocations(&self) -> PortRegistryDocument {
        self.load_registry()
    }

    async fn first_free_candidate(&self, candidates: &[BasePort]) -> Option<BasePort> {
        for &candidate in candidates {
            if self.range_is_free(candidate).await {
                return Some(candidate);
            }
            debug!(base = %candidate, "candidate range in use");
        }
        None
    }

    async fn range_is_free(&self, base: BasePort) -> bool {
        for port in base.probe_ports() {
            if self.probe.is_in_use(port).await {
                return false;
            }
        }
        true
    }

    fn commit(&self, instance: &InstanceName, chosen: BasePort) -> PortAllocationResult<BasePort> {
        let _lease = self.acquire_lease();
        let mut registry = self.load_registry();
        if let Some(existing) = registry.get(instance) {
            return Ok(existing);
        }

        let base = match registry.overlapping(chosen) {
            None => chosen,
            Some(owner) => {
                let candidates = candidate_bases(registry.highest());
                let fallback = first_candidate(instance, &registry, &candidates)?;
                warn!(
                    instance = %instance,
                    base = %fallback,
                    owner,
                    "probed range was taken meanwhile, assigning next range unverified"
                );
                fallback
            }
        };

        registry.insert(instance, base);
        self.persist(&registry);
        info!(instance = %instance, base = %base, "allocated port range");
        Ok(base)
    }

    fn acquire_lease(&self) -> DocumentLease {
        self.store.lock().unwrap_or_else(|err| {
            warn!(error = %err, "port registry lock unavailable, continuing unlocked");
            DocumentLease::unguarded()
        })
    }

    fn load_registry(&self) -> PortRegistryDocument {
        self.store.load().unwrap_or_else(|err| {
            warn!(error = %err, "port registry unreadable, treating as empty");
            PortRegistryDocument::new()
        })
    }

    fn persist(&self, registry: &PortRegistryDocument) {
        if let Err(err) = self.store.save(registry) {
            warn!(error = %err, "failed to persist port registry");
        }
    }
}

fn first_candidate(
    instance: &InstanceName,
    registry: &PortRegistryDocument,
    candidates: &[BasePort],
) -> PortAllocationResult<BasePort> {
    candidates
        .first()
        .copied()
        .ok_or_else(|| PortAllocationError::RangeExhausted {
            instance: instance.clone(),
            highest: registry
                .highest()
                .unwrap_or(BasePort::new(MCP_BASE_PORT)),
        })
}
