//! Port registry document.

use super::BasePort;
use crate::instance::InstanceName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Durable mapping from instance name to base port.
///
/// Serialises as `{"allocated_ports": {"<instance>": <port>}}`. Unknown
/// top-level keys are carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRegistryDocument {
    #[serde(default)]
    allocated_ports: BTreeMap<String, BasePort>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl PortRegistryDocument {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the base allocated to `instance`.
    #[must_use]
    pub fn get(&self, instance: &InstanceName) -> Option<BasePort> {
        self.allocated_ports.get(instance.as_str()).copied()
    }

    /// Records `base` for `instance`, returning any previous base.
    pub fn insert(&mut self, instance: &InstanceName, base: BasePort) -> Option<BasePort> {
        self.allocated_ports.insert(instance.as_str().to_owned(), base)
    }

    /// Removes the allocation for `instance`.
    pub fn remove(&mut self, instance: &InstanceName) -> Option<BasePort> {
        self.allocated_ports.remove(instance.as_str())
    }

    /// Returns the highest allocated base.
    #[must_use]
    pub fn highest(&self) -> Option<BasePort> {
        self.allocated_ports.values().copied().max()
    }

    /// Returns the name of an instance whose range overlaps `base`.
    #[must_use]
    pub fn overlapping(&self, base: BasePort) -> Option<&str> {
        self.allocated_ports
            .iter()
            .find(|(_, allocated)| allocated.overlaps(base))
            .map(|(name, _)| name.as_str())
    }

    /// Iterates allocations ordered by instance name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, BasePort)> {
        self.allocated_ports
            .iter()
            .map(|(name, base)| (name.as_str(), *base))
    }

    /// Returns the number of allocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allocated_ports.len()
    }

    /// Returns whether no allocation exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocated_ports.is_empty()
    }
}
