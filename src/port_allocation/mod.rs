//! Durable, collision-free port ranges for sandboxed instances.
//!
//! Every instance owns one base port. The range `[base, base + 100)` is
//! exclusive to that instance, and each well-known tool listens at a fixed
//! offset inside it. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
