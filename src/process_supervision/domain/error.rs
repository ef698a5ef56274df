//! Error types for process supervision.

use super::ServerKey;
use crate::instance::InstanceName;
use crate::port_allocation::domain::PortAllocationError;
use crate::server_config::ports::InstanceRegistryError;
use crate::templates::TemplateError;
use std::sync::Arc;
use thiserror::Error;

/// Failures raised by process adapters.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The executable could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        /// Command line that failed.
        command: String,
        /// Underlying failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// A termination signal could not be delivered.
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        /// Target process identifier.
        pid: u32,
        /// Underlying failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl ProcessError {
    /// Wraps a spawn failure for `command`.
    pub fn spawn(
        command: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Spawn {
            command: command.into(),
            source: Arc::new(err),
        }
    }

    /// Wraps a signalling failure for `pid`.
    pub fn signal(pid: u32, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Signal {
            pid,
            source: Arc::new(err),
        }
    }
}

/// Errors returned by the process supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The instance has no configuration document.
    #[error("instance {0} has no server configuration")]
    NoConfiguration(InstanceName),

    /// The configuration document has no entry for the server.
    #[error("server {0} is not configured")]
    NotConfigured(ServerKey),

    /// No process is tracked for the server.
    #[error("server {0} is not running")]
    NotTracked(ServerKey),

    /// The server could not be launched.
    #[error("failed to launch server {key}: {source}")]
    Launch {
        /// Server being launched.
        key: ServerKey,
        /// Adapter failure.
        #[source]
        source: ProcessError,
    },

    /// A termination request failed; the process is still tracked.
    #[error("failed to stop server {key}: {source}")]
    Terminate {
        /// Server being stopped.
        key: ServerKey,
        /// Adapter failure.
        #[source]
        source: ProcessError,
    },

    /// The process survived both termination phases; it is still tracked.
    #[error("server {0} did not exit after being killed")]
    StillRunning(ServerKey),

    /// Instance registry access failed.
    #[error(transparent)]
    Registry(#[from] InstanceRegistryError),

    /// Template rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Port resolution failed.
    #[error(transparent)]
    Ports(#[from] PortAllocationError),
}

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
