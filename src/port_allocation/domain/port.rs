//! Base ports and range arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest base port; the first allocation lands one range above it.
pub const MCP_BASE_PORT: u16 = 9000;

/// Width of the range owned by one instance.
pub const MCP_PORT_RANGE: u16 = 100;

/// Offsets probed to decide whether a candidate range is free.
pub const PROBE_OFFSETS: [u16; 4] = [10, 20, 30, 40];

/// Number of successive candidate ranges probed before falling back.
pub const PROBE_ATTEMPTS: u16 = 10;

/// First port of an instance-exclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasePort(u16);

impl BasePort {
    /// Wraps a raw port number.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the raw port number.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns the port at `offset` inside this range.
    ///
    /// Returns `None` when the result would exceed `u16::MAX`.
    #[must_use]
    pub const fn port_at(self, offset: u16) -> Option<u16> {
        self.0.checked_add(offset)
    }

    /// Returns the ports probed for availability, in probe order.
    pub fn probe_ports(self) -> impl Iterator<Item = u16> {
        PROBE_OFFSETS
            .into_iter()
            .filter_map(move |offset| self.port_at(offset))
    }

    /// Returns whether two ranges share at least one port.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.0.abs_diff(other.0) < MCP_PORT_RANGE
    }
}

impl fmt::Display for BasePort {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<BasePort> for u16 {
    fn from(value: BasePort) -> Self {
        value.0
    }
}

/// Returns whether `[base, base + MCP_PORT_RANGE)` fits in the port space.
const fn range_fits(base: u32) -> bool {
    base + (MCP_PORT_RANGE as u32) - 1 <= u16::MAX as u32
}

/// Returns the candidate bases considered for a new allocation.
///
/// The first candidate is one range above the highest existing base (or
/// above [`MCP_BASE_PORT`] when that is higher); later candidates step by
/// one range. Candidates whose range would leave the port space are
/// dropped, so an empty result means the port space is exhausted.
#[must_use]
pub fn candidate_bases(highest_existing: Option<BasePort>) -> Vec<BasePort> {
    let floor = highest_existing.map_or(MCP_BASE_PORT, |base| base.value().max(MCP_BASE_PORT));
    let first = u32::from(floor) + u32::from(MCP_PORT_RANGE);

    (0..u32::from(PROBE_ATTEMPTS))
        .map(|step| first + step * u32::from(MCP_PORT_RANGE))
        .take_while(|base| range_fits(*base))
        .filter_map(|base| u16::try_from(base).ok())
        .map(BasePort::new)
        .collect()
}
