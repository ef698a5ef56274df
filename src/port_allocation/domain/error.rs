//! Error types for port allocation.

use super::BasePort;
use crate::instance::InstanceName;
use thiserror::Error;

/// Errors returned by port allocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortAllocationError {
    /// No candidate range above the highest allocation fits in the port
    /// space.
    #[error("no port range left above {highest} for instance {instance}")]
    RangeExhausted {
        /// Instance requesting a range.
        instance: InstanceName,
        /// Highest base currently allocated.
        highest: BasePort,
    },

    /// A registered base is too close to the end of the port space to hold
    /// the requested offset.
    #[error("port {base} + {offset} for instance {instance} exceeds the port space")]
    PortOutOfRange {
        /// Instance owning the range.
        instance: InstanceName,
        /// Registered base.
        base: BasePort,
        /// Requested offset.
        offset: u16,
    },
}

/// Result type for port allocation operations.
pub type PortAllocationResult<T> = Result<T, PortAllocationError>;
