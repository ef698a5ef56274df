//! Helper-server process supervision.
//!
//! A [`services::ProcessSupervisor`] launches the servers configured for an
//! instance, captures their merged output into bounded logs, and stops them
//! with a graceful-then-forceful sequence. It follows the same hexagonal
//! layout as the rest of the crate:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
