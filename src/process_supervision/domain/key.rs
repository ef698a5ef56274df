//! Identity of a supervised server.

use crate::instance::InstanceName;
use std::fmt;

/// One server of one instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerKey {
    instance: InstanceName,
    server: String,
}

impl ServerKey {
    /// Creates a key.
    #[must_use]
    pub fn new(instance: InstanceName, server: impl Into<String>) -> Self {
        Self {
            instance,
            server: server.into(),
        }
    }

    /// Returns the owning instance.
    #[must_use]
    pub const fn instance(&self) -> &InstanceName {
        &self.instance
    }

    /// Returns the server name.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.instance, self.server)
    }
}
